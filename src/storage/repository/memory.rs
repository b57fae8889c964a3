// 内存数据库实现 - 用于测试和不落盘的临时档案

use super::EntryRepository;
use crate::storage::models::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// 内存实现 - 数据随进程消亡
pub struct MemoryRepository {
    entries: RwLock<Vec<CareEntry>>,
    calls: RwLock<Vec<ExtractionCallRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            calls: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryRepository for MemoryRepository {
    async fn insert_entry(&self, entry: &CareEntry) -> Result<()> {
        let mut entries = self.entries.write().await;

        // 与SQLite的主键约束保持一致
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(anyhow!("条目ID已存在: {}", entry.id));
        }

        entries.push(entry.clone());
        Ok(())
    }

    async fn get_all_entries(&self) -> Result<Vec<CareEntry>> {
        let mut entries = self.entries.read().await.clone();
        // 先反转成插入顺序倒序，稳定排序后同一时间戳的条目保持后写在前
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    async fn get_entries_in_range(&self, start: &str, end: &str) -> Result<Vec<CareEntry>> {
        let mut entries: Vec<CareEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.timestamp.as_str() >= start && e.timestamp.as_str() < end)
            .cloned()
            .collect();
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    async fn count_entries(&self) -> Result<i64> {
        Ok(self.entries.read().await.len() as i64)
    }

    async fn clear_entries(&self) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn insert_extraction_call(&self, record: &ExtractionCallRecord) -> Result<i64> {
        let mut calls = self.calls.write().await;
        let id = calls.len() as i64 + 1;
        let mut stored = record.clone();
        stored.id = Some(id);
        calls.push(stored);
        Ok(id)
    }

    async fn get_recent_extraction_errors(&self, limit: i64) -> Result<Vec<ExtractionCallRecord>> {
        let mut errors: Vec<ExtractionCallRecord> = self
            .calls
            .read()
            .await
            .iter()
            .filter(|c| c.error_message.is_some())
            .cloned()
            .collect();
        errors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        errors.truncate(limit.max(0) as usize);
        Ok(errors)
    }

    async fn get_stats(&self) -> Result<(i64, i64)> {
        Ok((
            self.entries.read().await.len() as i64,
            self.calls.read().await.len() as i64,
        ))
    }

    async fn initialize_tables(&self) -> Result<()> {
        // 内存库无需建表
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_entry(id: &str, ts: &str) -> CareEntry {
        CareEntry {
            id: id.to_string(),
            kind: "symptom".to_string(),
            title: "Dizziness".to_string(),
            details: "morning dizziness".to_string(),
            timestamp: ts.to_string(),
            severity: Some("low".to_string()),
            warning: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_newest_first() {
        let repo = MemoryRepository::new();
        repo.insert_entry(&sample_entry("a", "2026-08-01T08:00:00.000Z"))
            .await
            .unwrap();
        repo.insert_entry(&sample_entry("b", "2026-08-02T08:00:00.000Z"))
            .await
            .unwrap();

        let entries = repo.get_all_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "b");
        assert_eq!(entries[1].id, "a");
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let repo = MemoryRepository::new();
        repo.insert_entry(&sample_entry("a", "2026-08-01T08:00:00.000Z"))
            .await
            .unwrap();
        let err = repo
            .insert_entry(&sample_entry("a", "2026-08-02T08:00:00.000Z"))
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_range_query_half_open() {
        let repo = MemoryRepository::new();
        repo.insert_entry(&sample_entry("a", "2026-07-31T23:59:59.000Z"))
            .await
            .unwrap();
        repo.insert_entry(&sample_entry("b", "2026-08-01T00:00:00.000Z"))
            .await
            .unwrap();
        repo.insert_entry(&sample_entry("c", "2026-09-01T00:00:00.000Z"))
            .await
            .unwrap();

        let entries = repo
            .get_entries_in_range("2026-08-01T00:00:00.000Z", "2026-09-01T00:00:00.000Z")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "b");
    }

    #[tokio::test]
    async fn test_clear_entries() {
        let repo = MemoryRepository::new();
        repo.insert_entry(&sample_entry("a", "2026-08-01T08:00:00.000Z"))
            .await
            .unwrap();
        let removed = repo.clear_entries().await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.count_entries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_extraction_error_log() {
        let repo = MemoryRepository::new();
        let ok = ExtractionCallRecord {
            id: None,
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            call_type: "analyze_text".to_string(),
            request_body: "{}".to_string(),
            response_body: Some("{}".to_string()),
            status_code: Some(200),
            error_message: None,
            latency_ms: Some(120),
            token_usage: None,
            created_at: Utc::now(),
        };
        let failed = ExtractionCallRecord {
            error_message: Some("超时".to_string()),
            status_code: Some(500),
            ..ok.clone()
        };

        repo.insert_extraction_call(&ok).await.unwrap();
        repo.insert_extraction_call(&failed).await.unwrap();

        let errors = repo.get_recent_extraction_errors(10).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_message.as_deref(), Some("超时"));
    }
}
