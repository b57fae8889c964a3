// 数据库操作模块 - 条目存储的统一入口

use super::config::DatabaseConfig;
use super::models::*;
use super::repository::{memory::MemoryRepository, sqlite::SqliteRepository, EntryRepository};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 数据库管理器 - 按配置选择具体实现，对上层屏蔽差异
pub struct Database {
    repository: Arc<dyn EntryRepository>,
    /// SQLite文件路径（内存库为None，用于统计文件大小）
    db_path: Option<PathBuf>,
}

impl Database {
    /// 按配置创建数据库
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        match config {
            DatabaseConfig::SQLite { db_path } => {
                let repo = SqliteRepository::new(db_path).await?;
                Ok(Self {
                    repository: Arc::new(repo),
                    db_path: Some(PathBuf::from(db_path)),
                })
            }
            DatabaseConfig::Memory => {
                info!("使用内存数据库（数据不落盘）");
                let repo = MemoryRepository::new();
                repo.initialize_tables().await?;
                Ok(Self {
                    repository: Arc::new(repo),
                    db_path: None,
                })
            }
        }
    }

    /// 用现成的repository构建（测试用）
    pub fn with_repository(repository: Arc<dyn EntryRepository>) -> Self {
        Self {
            repository,
            db_path: None,
        }
    }

    /// 追加新条目 - 在写入边界分配id和时间戳，保证两者不可变
    pub async fn append_entry(&self, input: NewEntry) -> Result<CareEntry> {
        let entry = CareEntry {
            id: Uuid::new_v4().to_string(),
            kind: input.kind.as_str().to_string(),
            title: input.title,
            details: input.details,
            timestamp: format_timestamp(Utc::now()),
            severity: input.severity.map(|s| s.as_str().to_string()),
            warning: input.warning,
        };

        self.repository.insert_entry(&entry).await?;
        info!("新条目已写入: {} ({})", entry.title, entry.kind);
        Ok(entry)
    }

    /// 获取所有条目（最新在前）
    pub async fn get_all_entries(&self) -> Result<Vec<CareEntry>> {
        self.repository.get_all_entries().await
    }

    /// 获取时间范围内的条目（含start不含end，最新在前）
    pub async fn get_entries_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CareEntry>> {
        self.repository
            .get_entries_in_range(&format_timestamp(start), &format_timestamp(end))
            .await
    }

    /// 条目总数
    pub async fn count_entries(&self) -> Result<i64> {
        self.repository.count_entries().await
    }

    /// 清空全部条目
    pub async fn clear_entries(&self) -> Result<u64> {
        let removed = self.repository.clear_entries().await?;
        info!("条目已全部清空，共删除 {} 条", removed);
        Ok(removed)
    }

    /// 插入提取调用记录
    pub async fn insert_extraction_call(&self, record: &ExtractionCallRecord) -> Result<i64> {
        self.repository.insert_extraction_call(record).await
    }

    /// 获取最近的提取调用错误
    pub async fn get_recent_extraction_errors(
        &self,
        limit: i64,
    ) -> Result<Vec<ExtractionCallRecord>> {
        self.repository.get_recent_extraction_errors(limit).await
    }

    /// 获取存储统计信息
    pub async fn get_storage_stats(&self) -> Result<StoreStats> {
        let (entry_count, extraction_call_count) = self.repository.get_stats().await?;

        let database_size = match &self.db_path {
            Some(path) => std::fs::metadata(path).map(|m| m.len() as i64).unwrap_or(0),
            None => 0,
        };

        Ok(StoreStats {
            entry_count,
            extraction_call_count,
            database_size,
        })
    }

    /// 数据库类型标识
    pub fn db_type(&self) -> &str {
        self.repository.db_type()
    }
}
