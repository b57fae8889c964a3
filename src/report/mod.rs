// 报告领域 - 负责汇总条目生成医生可用的阶段性报告

pub mod exporter;

pub use exporter::ReportExporter;

use crate::scoring::{CareStatus, HealthScoreEngine};
use crate::storage::models::{parse_timestamp, CareEntry, EntryKind, Severity};
use crate::storage::Database;
use crate::utils::validation::validate_month_label;
use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// 月份摘要 - 报告历史列表的一项
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    /// 规范月份标识 (格式: YYYY-MM)
    pub month: String,
    /// 展示用标签 (如 "August 2026")
    pub label: String,
    /// 当月条目数量
    pub entry_count: usize,
}

/// 报告统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// 条目总数
    pub total_entries: usize,
    /// 用药条目数量
    pub medication_count: usize,
    /// 症状条目数量
    pub symptom_count: usize,
    /// 各严重程度的症状数量
    pub low_severity_count: usize,
    pub medium_severity_count: usize,
    pub high_severity_count: usize,
}

/// 照护报告 - 一个时间段内条目的汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareReport {
    /// 时间段标签
    pub period_label: String,
    /// 时间段起止（RFC3339）
    pub period_start: String,
    pub period_end: String,
    /// 报告生成时间（RFC3339）
    pub generated_at: String,
    /// 该时间段内条目的健康评分（以生成时间为基准）
    pub score: u8,
    /// 状态标签
    pub status: CareStatus,
    /// 统计
    pub stats: ReportStats,
    /// 条目列表（最新在前）
    pub entries: Vec<CareEntry>,
}

/// 报告生成器
pub struct ReportGenerator {
    db: Arc<Database>,
    engine: Arc<HealthScoreEngine>,
}

impl ReportGenerator {
    pub fn new(db: Arc<Database>, engine: Arc<HealthScoreEngine>) -> Self {
        Self { db, engine }
    }

    /// 列出有记录的月份（最新在前）
    pub async fn available_months(&self) -> Result<Vec<MonthSummary>> {
        let entries = self.db.get_all_entries().await?;

        // BTreeMap按月份标识排序，倒序输出
        let mut months: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &entries {
            if let Some(ts) = parse_timestamp(&entry.timestamp) {
                *months.entry(format!("{:04}-{:02}", ts.year(), ts.month())).or_insert(0) += 1;
            }
        }

        let summaries = months
            .into_iter()
            .rev()
            .map(|(month, entry_count)| {
                let label = month_display_label(&month).unwrap_or_else(|| month.clone());
                MonthSummary {
                    month,
                    label,
                    entry_count,
                }
            })
            .collect();

        Ok(summaries)
    }

    /// 生成指定月份的报告
    ///
    /// # 参数
    /// * `month` - 月份标识 (格式: YYYY-MM)
    pub async fn month_report(&self, month: &str) -> Result<CareReport> {
        let (year, mon) = validate_month_label(month).map_err(anyhow::Error::msg)?;

        let start = month_start(year, mon)?;
        let end = if mon == 12 {
            month_start(year + 1, 1)?
        } else {
            month_start(year, mon + 1)?
        };

        info!("生成月度报告: {}", month);

        let entries = self.db.get_entries_in_range(start, end).await?;
        let label = month_display_label(month).unwrap_or_else(|| month.to_string());
        Ok(self.assemble(label, start, end, entries))
    }

    /// 生成最近N天的滚动报告
    pub async fn recent_report(&self, days: i64) -> Result<CareReport> {
        let now = Utc::now();
        let start = now - Duration::days(days.max(1));
        // 范围查询右边界开区间，留出1秒把刚写入的条目也包含进来
        let end = now + Duration::seconds(1);

        info!("生成近{}天报告", days);

        let entries = self.db.get_entries_in_range(start, end).await?;
        let label = format!("Last {} Days", days.max(1));
        Ok(self.assemble(label, start, end, entries))
    }

    /// 汇总条目为报告
    fn assemble(
        &self,
        period_label: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        entries: Vec<CareEntry>,
    ) -> CareReport {
        let now = Utc::now();

        let mut stats = ReportStats {
            total_entries: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            match entry.entry_kind() {
                Some(EntryKind::Medication) => stats.medication_count += 1,
                Some(EntryKind::Symptom) => {
                    stats.symptom_count += 1;
                    match entry.severity_level() {
                        Some(Severity::Low) => stats.low_severity_count += 1,
                        Some(Severity::Medium) => stats.medium_severity_count += 1,
                        Some(Severity::High) => stats.high_severity_count += 1,
                        None => {}
                    }
                }
                None => {}
            }
        }

        // 报告评分只看报告范围内的条目
        let score_report = self.engine.score(&entries, now);

        CareReport {
            period_label,
            period_start: crate::storage::models::format_timestamp(start),
            period_end: crate::storage::models::format_timestamp(end),
            generated_at: crate::storage::models::format_timestamp(now),
            score: score_report.score,
            status: score_report.status,
            stats,
            entries,
        }
    }
}

/// 月份起点（UTC）
fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow::anyhow!("无效的年月: {}-{}", year, month))?;
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("无效的时间"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// 展示用月份标签 ("2026-08" -> "August 2026")
fn month_display_label(month: &str) -> Option<String> {
    let (year, mon) = validate_month_label(month).ok()?;
    let name = match mon {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => return None,
    };
    Some(format!("{} {}", name, year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::format_timestamp;
    use crate::storage::{DatabaseConfig, NewEntry};
    use crate::storage::{EntryKind, Severity};
    use crate::storage::EntryRepository;

    async fn memory_db() -> Arc<Database> {
        Arc::new(Database::new(&DatabaseConfig::Memory).await.unwrap())
    }

    fn generator(db: Arc<Database>) -> ReportGenerator {
        ReportGenerator::new(db, Arc::new(HealthScoreEngine::new()))
    }

    #[tokio::test]
    async fn test_recent_report_counts_and_score() {
        let db = memory_db().await;
        db.append_entry(NewEntry {
            kind: EntryKind::Medication,
            title: "Aspirin".to_string(),
            details: "100mg daily".to_string(),
            severity: None,
            warning: None,
        })
        .await
        .unwrap();
        db.append_entry(NewEntry {
            kind: EntryKind::Symptom,
            title: "Nausea".to_string(),
            details: "after breakfast".to_string(),
            severity: Some(Severity::Low),
            warning: None,
        })
        .await
        .unwrap();

        let report = generator(db).recent_report(30).await.unwrap();
        assert_eq!(report.stats.total_entries, 2);
        assert_eq!(report.stats.medication_count, 1);
        assert_eq!(report.stats.symptom_count, 1);
        assert_eq!(report.stats.low_severity_count, 1);
        // 最新症状为low且刚写入
        assert_eq!(report.score, 95);
    }

    #[tokio::test]
    async fn test_available_months_grouping() {
        // 经由Database写入的条目时间戳不可指定，用独立repository模拟历史数据
        let repo = crate::storage::MemoryRepository::new();
        let old = CareEntry {
            id: "old-entry".to_string(),
            kind: "symptom".to_string(),
            title: "Headache".to_string(),
            details: "mild".to_string(),
            timestamp: "2026-07-15T10:00:00.000Z".to_string(),
            severity: Some("low".to_string()),
            warning: None,
        };
        let recent = CareEntry {
            id: "recent-entry".to_string(),
            kind: "symptom".to_string(),
            title: "Cough".to_string(),
            details: "dry cough".to_string(),
            timestamp: format_timestamp(Utc::now()),
            severity: Some("low".to_string()),
            warning: None,
        };
        repo.insert_entry(&old).await.unwrap();
        repo.insert_entry(&recent).await.unwrap();
        let db = Arc::new(Database::with_repository(Arc::new(repo)));

        let months = generator(db).available_months().await.unwrap();
        assert_eq!(months.len(), 2);
        // 最新月份在前
        assert!(months[0].month > months[1].month);
        assert_eq!(months[1].month, "2026-07");
        assert_eq!(months[1].label, "July 2026");
        assert_eq!(months[1].entry_count, 1);
    }

    #[tokio::test]
    async fn test_month_report_filters_by_month() {
        let repo = crate::storage::MemoryRepository::new();
        for (id, ts) in [
            ("july", "2026-07-20T08:00:00.000Z"),
            ("august", "2026-08-03T08:00:00.000Z"),
        ] {
            repo.insert_entry(&CareEntry {
                id: id.to_string(),
                kind: "symptom".to_string(),
                title: "Fatigue".to_string(),
                details: "tired all day".to_string(),
                timestamp: ts.to_string(),
                severity: Some("medium".to_string()),
                warning: None,
            })
            .await
            .unwrap();
        }
        let db = Arc::new(Database::with_repository(Arc::new(repo)));

        let report = generator(db).month_report("2026-07").await.unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].id, "july");
        assert_eq!(report.period_label, "July 2026");
    }

    #[tokio::test]
    async fn test_month_report_rejects_bad_label() {
        let db = memory_db().await;
        assert!(generator(db).month_report("not-a-month").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_recent_report_full_score() {
        let db = memory_db().await;
        let report = generator(db).recent_report(30).await.unwrap();
        assert_eq!(report.stats.total_entries, 0);
        assert_eq!(report.score, 100);
        assert_eq!(report.status, CareStatus::Stable);
    }
}
