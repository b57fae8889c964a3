// SQLite 数据库实现

use super::EntryRepository;
use crate::storage::models::*;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

/// SQLite 数据库实现
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// 创建新的 SQLite 数据库连接
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("初始化 SQLite 数据库: {}", db_path);

        // 确保数据库文件的目录存在
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        // 创建连接池 - ?mode=rwc 确保数据库文件不存在时自动创建
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .idle_timeout(std::time::Duration::from_secs(300))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await?;

        let repo = Self { pool };

        // 初始化表结构
        repo.initialize_tables().await?;

        Ok(repo)
    }

    /// 获取连接池引用
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EntryRepository for SqliteRepository {
    // ========== 条目操作 ==========

    async fn insert_entry(&self, entry: &CareEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO care_entries (id, kind, title, details, timestamp, severity, warning)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        )
        .bind(&entry.id)
        .bind(&entry.kind)
        .bind(&entry.title)
        .bind(&entry.details)
        .bind(&entry.timestamp)
        .bind(&entry.severity)
        .bind(&entry.warning)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_all_entries(&self) -> Result<Vec<CareEntry>> {
        // rowid兜底排序：同一毫秒写入的条目按插入顺序倒序
        let entries = sqlx::query_as::<_, CareEntry>(
            r#"
            SELECT id, kind, title, details, timestamp, severity, warning
            FROM care_entries
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn get_entries_in_range(&self, start: &str, end: &str) -> Result<Vec<CareEntry>> {
        // 时间戳统一格式落库，TEXT比较即时间比较
        let entries = sqlx::query_as::<_, CareEntry>(
            r#"
            SELECT id, kind, title, details, timestamp, severity, warning
            FROM care_entries
            WHERE timestamp >= ?1 AND timestamp < ?2
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn count_entries(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM care_entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn clear_entries(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM care_entries")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ========== 提取调用记录 ==========

    async fn insert_extraction_call(&self, record: &ExtractionCallRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO extraction_calls
                (provider, model, call_type, request_body, response_body,
                 status_code, error_message, latency_ms, token_usage, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        )
        .bind(&record.provider)
        .bind(&record.model)
        .bind(&record.call_type)
        .bind(&record.request_body)
        .bind(&record.response_body)
        .bind(record.status_code)
        .bind(&record.error_message)
        .bind(record.latency_ms)
        .bind(&record.token_usage)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_recent_extraction_errors(&self, limit: i64) -> Result<Vec<ExtractionCallRecord>> {
        let records = sqlx::query_as::<_, ExtractionCallRecord>(
            r#"
            SELECT id, provider, model, call_type, request_body, response_body,
                   status_code, error_message, latency_ms, token_usage, created_at
            FROM extraction_calls
            WHERE error_message IS NOT NULL
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // ========== 统计信息 ==========

    async fn get_stats(&self) -> Result<(i64, i64)> {
        let entry_count = self.count_entries().await?;

        let row = sqlx::query("SELECT COUNT(*) as count FROM extraction_calls")
            .fetch_one(&self.pool)
            .await?;
        let call_count = row.get::<i64, _>("count");

        Ok((entry_count, call_count))
    }

    // ========== 数据库初始化和元数据 ==========

    async fn initialize_tables(&self) -> Result<()> {
        // 创建条目表
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS care_entries (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                details TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                severity TEXT,
                warning TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        // 创建提取调用记录表
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS extraction_calls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                call_type TEXT NOT NULL,
                request_body TEXT NOT NULL,
                response_body TEXT,
                status_code INTEGER,
                error_message TEXT,
                latency_ms INTEGER,
                token_usage TEXT,
                created_at DATETIME NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        // 创建索引
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_care_entries_timestamp ON care_entries(timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_care_entries_kind ON care_entries(kind)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_extraction_calls_created_at ON extraction_calls(created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn db_type(&self) -> &str {
        "sqlite"
    }
}
