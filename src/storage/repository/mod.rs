// Repository 抽象层 - 定义数据库操作接口

pub mod memory;
pub mod sqlite;

use super::models::*;
use anyhow::Result;
use async_trait::async_trait;

/// 数据库操作接口 - 所有数据库实现必须实现此 trait
#[async_trait]
pub trait EntryRepository: Send + Sync {
    // ========== 条目操作 ==========

    /// 插入新条目（条目不可更新，不提供update操作）
    async fn insert_entry(&self, entry: &CareEntry) -> Result<()>;

    /// 获取所有条目（按时间倒序，最新在前）
    async fn get_all_entries(&self) -> Result<Vec<CareEntry>>;

    /// 获取时间范围内的条目（按时间倒序）
    ///
    /// 边界为RFC3339字符串，含`start`不含`end`
    async fn get_entries_in_range(&self, start: &str, end: &str) -> Result<Vec<CareEntry>>;

    /// 条目总数
    async fn count_entries(&self) -> Result<i64>;

    /// 清空全部条目（用户主动重置，唯一的删除途径）
    async fn clear_entries(&self) -> Result<u64>;

    // ========== 提取调用记录 ==========

    /// 插入提取调用记录
    async fn insert_extraction_call(&self, record: &ExtractionCallRecord) -> Result<i64>;

    /// 获取最近的提取调用错误
    async fn get_recent_extraction_errors(&self, limit: i64) -> Result<Vec<ExtractionCallRecord>>;

    // ========== 统计信息 ==========

    /// 获取统计信息 (条目数, 提取调用数)
    async fn get_stats(&self) -> Result<(i64, i64)>;

    // ========== 数据库初始化和元数据 ==========

    /// 初始化数据库表结构
    async fn initialize_tables(&self) -> Result<()>;

    /// 获取数据库类型标识
    fn db_type(&self) -> &str;
}
