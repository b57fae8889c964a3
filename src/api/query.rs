//! 数据查询命令
//!
//! 提供各类数据查询接口，包括：
//! - 条目列表与健康评分
//! - 在用药物汇总
//! - 报告月份与报告内容
//! - 系统状态查询

use crate::models::{StorageUsage, SystemStatus};
use crate::report::{CareReport, MonthSummary, ReportGenerator};
use crate::scoring::ScoreReport;
use crate::storage::{CareEntry, EntryKind, ExtractionCallRecord};
use crate::utils::validation::validate_limit;
use crate::AppState;
use chrono::Utc;
use std::collections::HashMap;

/// 获取全部条目（最新在前）
pub async fn get_entries(state: &AppState) -> Result<Vec<CareEntry>, String> {
    state
        .storage_domain
        .get_db()
        .get_all_entries()
        .await
        .map_err(|e| e.to_string())
}

/// 获取当前健康评分
///
/// 评分在每次读取时基于全部症状历史重算，不做缓存
pub async fn get_health_score(state: &AppState) -> Result<ScoreReport, String> {
    let entries = state
        .storage_domain
        .get_db()
        .get_all_entries()
        .await
        .map_err(|e| e.to_string())?;

    Ok(state.score_engine.score(&entries, Utc::now()))
}

/// 获取在用药物列表（按标题去重，保留最近一次记录）
pub async fn get_current_medications(state: &AppState) -> Result<Vec<CareEntry>, String> {
    let entries = state
        .storage_domain
        .get_db()
        .get_all_entries()
        .await
        .map_err(|e| e.to_string())?;

    Ok(dedupe_medications(entries))
}

/// 药物去重 - 标题大小写不敏感，输入最新在前时保留最近一条
pub(crate) fn dedupe_medications(entries: Vec<CareEntry>) -> Vec<CareEntry> {
    let mut seen: HashMap<String, ()> = HashMap::new();
    let mut medications = Vec::new();

    for entry in entries {
        if entry.entry_kind() != Some(EntryKind::Medication) {
            continue;
        }
        let key = entry.title.trim().to_lowercase();
        if seen.insert(key, ()).is_none() {
            medications.push(entry);
        }
    }

    medications
}

/// 列出有记录的月份（用于报告历史）
pub async fn get_available_months(state: &AppState) -> Result<Vec<MonthSummary>, String> {
    report_generator(state)
        .available_months()
        .await
        .map_err(|e| e.to_string())
}

/// 获取指定月份的报告
///
/// # 参数
/// - `month`: 月份标识 (格式: YYYY-MM)
pub async fn get_month_report(state: &AppState, month: String) -> Result<CareReport, String> {
    report_generator(state)
        .month_report(&month)
        .await
        .map_err(|e| e.to_string())
}

/// 获取近期滚动报告（窗口天数取配置）
pub async fn get_recent_report(state: &AppState) -> Result<CareReport, String> {
    let days = state
        .storage_domain
        .get_settings()
        .get()
        .await
        .report_recent_days;

    report_generator(state)
        .recent_report(days)
        .await
        .map_err(|e| e.to_string())
}

/// 获取系统状态（先刷新存储使用情况）
pub async fn get_system_status(state: &AppState) -> Result<SystemStatus, String> {
    refresh_storage_usage(state).await;
    Ok(state.system_domain.get_status().get().await)
}

/// 获取最近的提取调用错误
pub async fn get_recent_extraction_errors(
    state: &AppState,
    limit: i64,
) -> Result<Vec<ExtractionCallRecord>, String> {
    validate_limit(limit)?;
    state
        .storage_domain
        .get_db()
        .get_recent_extraction_errors(limit)
        .await
        .map_err(|e| e.to_string())
}

/// 构建报告生成器（复用AppState里的数据库和评分引擎）
fn report_generator(state: &AppState) -> ReportGenerator {
    ReportGenerator::new(
        state.storage_domain.get_db().clone(),
        state.score_engine.clone(),
    )
}

/// 从数据库刷新系统状态里的存储使用情况
pub(crate) async fn refresh_storage_usage(state: &AppState) {
    if let Ok(stats) = state.storage_domain.get_db().get_storage_stats().await {
        state
            .system_domain
            .get_status()
            .update_storage_usage(StorageUsage {
                database_size: stats.database_size.max(0) as u64,
                entry_count: stats.entry_count.max(0) as u32,
                extraction_call_count: stats.extraction_call_count.max(0) as u32,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(id: &str, title: &str, ts: &str) -> CareEntry {
        CareEntry {
            id: id.to_string(),
            kind: "medication".to_string(),
            title: title.to_string(),
            details: format!("details for {}", title),
            timestamp: ts.to_string(),
            severity: None,
            warning: None,
        }
    }

    #[test]
    fn test_dedupe_medications_case_insensitive() {
        // 输入最新在前
        let entries = vec![
            med("m3", "Aspirin", "2026-08-05T08:00:00.000Z"),
            med("m2", "aspirin", "2026-08-01T08:00:00.000Z"),
            med("m1", "Metformin", "2026-07-20T08:00:00.000Z"),
        ];

        let deduped = dedupe_medications(entries);
        assert_eq!(deduped.len(), 2);
        // 保留最近一次的Aspirin
        assert_eq!(deduped[0].id, "m3");
        assert_eq!(deduped[1].id, "m1");
    }

    #[test]
    fn test_dedupe_skips_symptoms() {
        let mut symptom = med("s1", "Nausea", "2026-08-05T08:00:00.000Z");
        symptom.kind = "symptom".to_string();

        let deduped = dedupe_medications(vec![symptom]);
        assert!(deduped.is_empty());
    }

    #[tokio::test]
    async fn test_health_score_via_state() {
        let state = crate::app::init_ephemeral().await.unwrap();
        let report = get_health_score(&state).await.unwrap();
        assert_eq!(report.score, 100);
    }
}
