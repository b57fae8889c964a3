// 集成测试 - 条目从确认入库到评分、报告的完整链路

use care_octopus::api;
use care_octopus::llm::{ExtractionRecord, RecordKind};
use care_octopus::models::{ExportFormat, ExportRequest, ExportScope};
use care_octopus::storage::{Database, DatabaseConfig, EntryKind, NewEntry, Severity};
use care_octopus::AppEvent;

fn symptom_record(title: &str, severity: Severity) -> ExtractionRecord {
    ExtractionRecord {
        kind: RecordKind::Symptom,
        title: title.to_string(),
        details: format!("observed: {}", title),
        severity: Some(severity),
        warning: None,
        confidence: None,
    }
}

#[tokio::test]
async fn test_sqlite_append_and_read_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data/care.db");
    let db = Database::new(&DatabaseConfig::SQLite {
        db_path: db_path.to_string_lossy().to_string(),
    })
    .await
    .unwrap();

    let first = db
        .append_entry(NewEntry {
            kind: EntryKind::Medication,
            title: "Lisinopril 10mg".to_string(),
            details: "Once daily in the morning".to_string(),
            severity: None,
            warning: Some("May cause dry cough".to_string()),
        })
        .await
        .unwrap();

    let second = db
        .append_entry(NewEntry {
            kind: EntryKind::Symptom,
            title: "Dizziness".to_string(),
            details: "Light headed after standing".to_string(),
            severity: Some(Severity::Low),
            warning: None,
        })
        .await
        .unwrap();

    // id由存储层分配且唯一
    assert_ne!(first.id, second.id);

    // 读取为最新在前
    let entries = db.get_all_entries().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, second.id);
    assert_eq!(entries[1].warning.as_deref(), Some("May cause dry cough"));

    // 数据库文件真实落盘
    let stats = db.get_storage_stats().await.unwrap();
    assert_eq!(stats.entry_count, 2);
    assert!(db_path.exists());

    // 清空是唯一的删除途径
    assert_eq!(db.clear_entries().await.unwrap(), 2);
    assert!(db.get_all_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_entry_updates_score_and_events() {
    let state = care_octopus::app::init_ephemeral().await.unwrap();
    let mut events = state.event_bus.subscribe();

    // 无任何记录时满分
    assert_eq!(api::get_health_score(&state).await.unwrap().score, 100);

    api::save_entry(&state, symptom_record("Chest pain", Severity::High))
        .await
        .unwrap();

    // 最新症状high -> 60
    let report = api::get_health_score(&state).await.unwrap();
    assert_eq!(report.score, 60);
    assert_eq!(report.status.label(), "Attention Needed");

    // 事件按顺序广播：EntrySaved -> ScoreUpdated
    let mut saw_entry_saved = false;
    let mut saw_score_updated = false;
    while let Ok(event) = events.try_recv() {
        match event {
            AppEvent::EntrySaved { kind, .. } => {
                assert_eq!(kind, "symptom");
                saw_entry_saved = true;
            }
            AppEvent::ScoreUpdated { score, .. } => {
                assert_eq!(score, 60);
                saw_score_updated = true;
            }
            _ => {}
        }
    }
    assert!(saw_entry_saved);
    assert!(saw_score_updated);
}

#[tokio::test]
async fn test_medications_do_not_change_score() {
    let state = care_octopus::app::init_ephemeral().await.unwrap();

    api::save_entry(
        &state,
        ExtractionRecord {
            kind: RecordKind::Medication,
            title: "Atorvastatin 20mg".to_string(),
            details: "Once daily at night".to_string(),
            severity: None,
            warning: None,
            confidence: Some(95.0),
        },
    )
    .await
    .unwrap();

    // 仅有用药记录时评分保持满分
    assert_eq!(api::get_health_score(&state).await.unwrap().score, 100);
}

#[tokio::test]
async fn test_current_medications_deduped() {
    let state = care_octopus::app::init_ephemeral().await.unwrap();

    for title in ["Aspirin 100mg", "aspirin 100mg", "Metformin 500mg"] {
        api::save_entry(
            &state,
            ExtractionRecord {
                kind: RecordKind::Medication,
                title: title.to_string(),
                details: "per label".to_string(),
                severity: None,
                warning: None,
                confidence: None,
            },
        )
        .await
        .unwrap();
    }

    let medications = api::get_current_medications(&state).await.unwrap();
    assert_eq!(medications.len(), 2);
}

#[tokio::test]
async fn test_recent_report_and_export() {
    let state = care_octopus::app::init_ephemeral().await.unwrap();

    api::save_entry(&state, symptom_record("Nausea", Severity::Low))
        .await
        .unwrap();

    let report = api::get_recent_report(&state).await.unwrap();
    assert_eq!(report.stats.symptom_count, 1);
    assert_eq!(report.score, 95);

    // 报告月份列表包含当月
    let months = api::get_available_months(&state).await.unwrap();
    assert_eq!(months.len(), 1);
    assert_eq!(months[0].entry_count, 1);

    // 导出JSON并验证文件
    let dir = tempfile::tempdir().unwrap();
    let path = api::export_report(
        &state,
        ExportRequest {
            scope: ExportScope::Month {
                month: months[0].month.clone(),
            },
            format: ExportFormat::Json,
            output_dir: Some(dir.path().to_string_lossy().to_string()),
        },
    )
    .await
    .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["stats"]["symptomCount"], 1);
}

#[tokio::test]
async fn test_system_status_tracks_entries() {
    let state = care_octopus::app::init_ephemeral().await.unwrap();

    api::save_entry(&state, symptom_record("Headache", Severity::Medium))
        .await
        .unwrap();

    let status = api::get_system_status(&state).await.unwrap();
    assert!(!status.is_extracting);
    assert_eq!(status.storage_usage.entry_count, 1);
    assert!(status.last_entry_time.is_some());
}
