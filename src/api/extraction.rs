//! 提取与确认保存接口
//!
//! 捕获->提取->确认->入库 的主流程：
//! - 展示壳把照片或症状文本交给analyze_*，拿到结构化提取结果
//! - 用户确认后调用save_entry落库

use crate::event_bus::AppEvent;
use crate::llm::{ExtractionRecord, RecordKind};
use crate::storage::{CareEntry, EntryKind, NewEntry, Severity};
use crate::utils::validation::{validate_new_entry, validate_symptom_text};
use crate::AppState;
use chrono::Utc;
use tracing::{error, info};

/// 分析药品标签/医疗报告照片
///
/// # 参数
/// - `image`: 照片原始字节（任意常见格式，内部归一化为JPEG）
///
/// # 返回
/// - `Ok(ExtractionRecord)`: 结构化提取结果，待用户确认
/// - `Err(String)`: 错误信息
pub async fn analyze_image(state: &AppState, image: Vec<u8>) -> Result<ExtractionRecord, String> {
    if image.is_empty() {
        return Err("图片数据为空".to_string());
    }

    // 归一化：缩放+JPEG重编码，控制上传体积
    let settings = state.storage_domain.get_settings().get().await;
    let image_settings = settings.image_settings.unwrap_or_default();
    let normalized = crate::utils::image::normalize_image(&image, &image_settings)
        .map_err(|e| format!("图片处理失败: {}", e))?;

    run_extraction(state, "analyze_image", move |handle| async move {
        handle.analyze_image(normalized).await
    })
    .await
}

/// 分析症状描述文本（语音转写或手动输入）
pub async fn analyze_text(state: &AppState, text: String) -> Result<ExtractionRecord, String> {
    validate_symptom_text(&text)?;

    run_extraction(state, "analyze_text", move |handle| async move {
        handle.analyze_text(&text).await
    })
    .await
}

/// 提取流程的公共骨架：状态标记、事件发布、错误记录
async fn run_extraction<F, Fut>(
    state: &AppState,
    call_type: &str,
    call: F,
) -> Result<ExtractionRecord, String>
where
    F: FnOnce(crate::actors::ExtractionHandle) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<ExtractionRecord>>,
{
    let status = state.system_domain.get_status();

    status.set_extracting(true).await;
    state.event_bus.publish(AppEvent::ExtractionStarted {
        call_type: call_type.to_string(),
    });

    let handle = state.extraction_domain.get_handle().clone();
    let result = call(handle).await;

    status.set_extracting(false).await;

    match result {
        Ok(record) => {
            // 边界校验：不合规的LLM载荷在这里拒绝，不往确认界面送
            if let Err(reason) = record.validate() {
                error!("提取结果未通过校验: {}", reason);
                status.set_error(Some(reason.clone())).await;
                state.event_bus.publish(AppEvent::ExtractionFailed {
                    call_type: call_type.to_string(),
                    error: reason.clone(),
                });
                return Err(format!("提取结果不可用: {}", reason));
            }

            info!("提取完成: {} ({})", record.title, call_type);
            status.set_error(None).await;
            state.event_bus.publish(AppEvent::ExtractionCompleted {
                call_type: call_type.to_string(),
                title: record.title.clone(),
            });
            Ok(record)
        }
        Err(e) => {
            let message = e.to_string();
            error!("提取失败 ({}): {}", call_type, message);
            status.set_error(Some(message.clone())).await;
            state.event_bus.publish(AppEvent::ExtractionFailed {
                call_type: call_type.to_string(),
                error: message.clone(),
            });
            Err(message)
        }
    }
}

/// 用户确认后保存提取结果为照护条目
///
/// id和时间戳由存储层分配；条目一经写入不可修改
pub async fn save_entry(state: &AppState, record: ExtractionRecord) -> Result<CareEntry, String> {
    record.validate()?;

    // report类（化验单、体检报告）归入症状条目
    let kind = match record.kind {
        RecordKind::Medication => EntryKind::Medication,
        RecordKind::Report | RecordKind::Symptom => EntryKind::Symptom,
    };

    // 严重程度缺失时按警示信息推断：有警示按high，否则low
    let severity = record.severity.or(Some(if record.warning.is_some() {
        Severity::High
    } else {
        Severity::Low
    }));

    let input = NewEntry {
        kind,
        title: record.title.trim().to_string(),
        details: record.details.trim().to_string(),
        severity,
        warning: record.warning,
    };
    validate_new_entry(&input)?;

    let db = state.storage_domain.get_db();
    let entry = db.append_entry(input).await.map_err(|e| e.to_string())?;

    state.event_bus.publish(AppEvent::EntrySaved {
        entry_id: entry.id.clone(),
        kind: entry.kind.clone(),
    });

    let status = state.system_domain.get_status();
    status.update_last_entry_time(Utc::now()).await;
    super::query::refresh_storage_usage(state).await;

    // 评分随存储内容变化，写入后立即重算并广播
    match db.get_all_entries().await {
        Ok(entries) => {
            let report = state.score_engine.score(&entries, Utc::now());
            state.event_bus.publish(AppEvent::ScoreUpdated {
                score: report.score,
                status: report.status,
            });
        }
        Err(e) => error!("写入后重算评分失败: {}", e),
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ExtractionRecord;

    #[tokio::test]
    async fn test_save_entry_maps_report_to_symptom() {
        let state = crate::app::init_ephemeral().await.unwrap();

        let record = ExtractionRecord {
            kind: RecordKind::Report,
            title: "Blood Panel Results".to_string(),
            details: "Cholesterol slightly elevated".to_string(),
            severity: None,
            warning: Some("Follow up with physician".to_string()),
            confidence: Some(92.0),
        };

        let entry = save_entry(&state, record).await.unwrap();
        assert_eq!(entry.kind, "symptom");
        // 无严重程度但有警示 -> high
        assert_eq!(entry.severity.as_deref(), Some("high"));
        assert!(!entry.id.is_empty());
    }

    #[tokio::test]
    async fn test_save_entry_defaults_low_without_warning() {
        let state = crate::app::init_ephemeral().await.unwrap();

        let record = ExtractionRecord {
            kind: RecordKind::Medication,
            title: "Metformin 500mg".to_string(),
            details: "Twice daily with meals".to_string(),
            severity: None,
            warning: None,
            confidence: Some(88.0),
        };

        let entry = save_entry(&state, record).await.unwrap();
        assert_eq!(entry.kind, "medication");
        assert_eq!(entry.severity.as_deref(), Some("low"));
    }

    #[tokio::test]
    async fn test_save_entry_rejects_invalid_record() {
        let state = crate::app::init_ephemeral().await.unwrap();

        let record = ExtractionRecord {
            kind: RecordKind::Symptom,
            title: "  ".to_string(),
            details: "x".to_string(),
            severity: None,
            warning: None,
            confidence: None,
        };

        assert!(save_entry(&state, record).await.is_err());
    }

    #[tokio::test]
    async fn test_analyze_text_rejects_empty_input() {
        let state = crate::app::init_ephemeral().await.unwrap();
        assert!(analyze_text(&state, "   ".to_string()).await.is_err());
    }
}
