//! 控制类接口
//!
//! 数据重置与报告导出

use crate::event_bus::AppEvent;
use crate::models::{ExportRequest, ExportScope};
use crate::report::{ReportExporter, ReportGenerator};
use crate::AppState;
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

/// 清空全部条目（用户主动重置时间线）
///
/// 这是条目唯一的删除途径，返回删除数量
pub async fn clear_entries(state: &AppState) -> Result<u64, String> {
    let db = state.storage_domain.get_db();
    let removed = db.clear_entries().await.map_err(|e| e.to_string())?;

    info!("时间线已重置，删除 {} 条", removed);
    state.event_bus.publish(AppEvent::EntriesCleared { removed });

    // 清空后评分回到满分
    let report = state.score_engine.score(&[], Utc::now());
    state.event_bus.publish(AppEvent::ScoreUpdated {
        score: report.score,
        status: report.status,
    });

    super::query::refresh_storage_usage(state).await;

    Ok(removed)
}

/// 导出报告，返回生成的文件路径
pub async fn export_report(state: &AppState, request: ExportRequest) -> Result<String, String> {
    let generator = ReportGenerator::new(
        state.storage_domain.get_db().clone(),
        state.score_engine.clone(),
    );

    let report = match &request.scope {
        ExportScope::Recent => {
            let days = state
                .storage_domain
                .get_settings()
                .get()
                .await
                .report_recent_days;
            generator.recent_report(days).await
        }
        ExportScope::Month { month } => generator.month_report(month).await,
    }
    .map_err(|e| e.to_string())?;

    let output_dir = match &request.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => state.data_dir.join("exports"),
    };

    let path = ReportExporter::export(&report, request.format, &output_dir)
        .await
        .map_err(|e| e.to_string())?;

    let path_str = path.to_string_lossy().to_string();
    state.event_bus.publish(AppEvent::ReportExported {
        path: path_str.clone(),
    });

    Ok(path_str)
}
