// 存储领域管理器
//
// 负责数据库和设置管理相关的功能
// 包含 Database 和 SettingsManager 两个核心组件

use crate::settings::SettingsManager;
use crate::storage::Database;
use std::sync::Arc;

/// 存储领域管理器 - 负责数据库和设置
#[derive(Clone)]
pub struct StorageDomain {
    db: Arc<Database>,
    settings: Arc<SettingsManager>,
}

impl StorageDomain {
    /// 创建新的存储领域管理器
    pub fn new(db: Arc<Database>, settings: Arc<SettingsManager>) -> Self {
        Self { db, settings }
    }

    /// 获取数据库
    pub fn get_db(&self) -> &Arc<Database> {
        &self.db
    }

    /// 获取设置管理器
    pub fn get_settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }
}
