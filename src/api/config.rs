//! 配置管理接口
//!
//! 设置的读写入口。更新后同步下发到提取Actor，保证落盘配置与
//! 运行中的provider实例一致

use crate::event_bus::AppEvent;
use crate::llm::{ExtractionConfig, GeminiConfig, OpenAiConfig};
use crate::models::{AppConfig, PersistedAppConfig};
use crate::AppState;
use tracing::info;

/// 获取当前配置
pub async fn get_config(state: &AppState) -> Result<PersistedAppConfig, String> {
    Ok(state.storage_domain.get_settings().get().await)
}

/// 更新配置（增量更新，None字段保持不变）
pub async fn update_config(
    state: &AppState,
    update: AppConfig,
) -> Result<PersistedAppConfig, String> {
    let settings = state.storage_domain.get_settings();
    let persisted = settings.update(update).await.map_err(|e| e.to_string())?;

    // 提取相关配置下发到Actor
    let extraction_config = build_extraction_config(&persisted);
    state
        .extraction_domain
        .get_handle()
        .configure(extraction_config)
        .await
        .map_err(|e| e.to_string())?;

    info!("配置已更新 (provider={})", persisted.llm_provider);
    state.event_bus.publish(AppEvent::ConfigUpdated {
        config_type: "app".to_string(),
    });

    Ok(persisted)
}

/// 从持久化配置组装提取服务配置
pub(crate) fn build_extraction_config(persisted: &PersistedAppConfig) -> ExtractionConfig {
    let mut config = ExtractionConfig {
        provider: persisted.llm_provider.clone(),
        ..Default::default()
    };

    if let Some(llm) = &persisted.llm_config {
        let base_url = if llm.base_url.trim().is_empty() {
            None
        } else {
            Some(llm.base_url.clone())
        };

        match persisted.llm_provider.as_str() {
            "openai" => {
                config.openai = OpenAiConfig {
                    api_key: llm.api_key.clone(),
                    model: llm.model.clone(),
                    base_url,
                };
            }
            // 未知provider名在Actor侧告警，这里按gemini组装
            _ => {
                config.gemini = GeminiConfig {
                    api_key: llm.api_key.clone(),
                    model: llm.model.clone(),
                    ..Default::default()
                };
                config.gemini.base_url = base_url;
            }
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LLMProviderConfig;

    #[test]
    fn test_build_extraction_config_for_gemini() {
        let persisted = PersistedAppConfig {
            llm_provider: "gemini".to_string(),
            llm_config: Some(LLMProviderConfig {
                api_key: "key-1".to_string(),
                model: "gemini-2.5-flash".to_string(),
                base_url: String::new(),
            }),
            ..Default::default()
        };

        let config = build_extraction_config(&persisted);
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.gemini.api_key, "key-1");
        assert!(config.gemini.base_url.is_none());
    }

    #[test]
    fn test_build_extraction_config_for_openai() {
        let persisted = PersistedAppConfig {
            llm_provider: "openai".to_string(),
            llm_config: Some(LLMProviderConfig {
                api_key: "sk-2".to_string(),
                model: "gpt-4o".to_string(),
                base_url: "https://proxy.example.com/v1/chat/completions".to_string(),
            }),
            ..Default::default()
        };

        let config = build_extraction_config(&persisted);
        assert_eq!(config.provider, "openai");
        assert_eq!(config.openai.model, "gpt-4o");
        assert!(config.openai.base_url.is_some());
    }

    #[tokio::test]
    async fn test_update_config_roundtrip() {
        let state = crate::app::init_ephemeral().await.unwrap();

        let updated = update_config(
            &state,
            AppConfig {
                llm_provider: Some("openai".to_string()),
                llm_config: Some(LLMProviderConfig {
                    api_key: "sk-test".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    base_url: String::new(),
                }),
                image_settings: None,
                report_recent_days: Some(7),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.llm_provider, "openai");
        assert_eq!(updated.report_recent_days, 7);

        // Actor侧的provider也随之切换
        let actor_config = state
            .extraction_domain
            .get_handle()
            .get_config()
            .await
            .unwrap();
        assert_eq!(actor_config.provider, "openai");
    }
}
