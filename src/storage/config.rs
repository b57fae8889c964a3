// 存储配置定义

use serde::{Deserialize, Serialize};

/// 数据库配置类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DatabaseConfig {
    /// SQLite 配置
    #[serde(rename = "sqlite")]
    SQLite {
        /// 数据库文件路径
        db_path: String,
    },
    /// 内存库配置（测试或临时档案，不落盘）
    #[serde(rename = "memory")]
    Memory,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::SQLite {
            db_path: "data/care-octopus.db".to_string(),
        }
    }
}
