use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::models::{AppConfig, PersistedAppConfig};

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedAppConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedAppConfig>(&bytes).unwrap_or_default()
            }
            _ => {
                let default = PersistedAppConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub async fn get(&self) -> PersistedAppConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: AppConfig) -> Result<PersistedAppConfig> {
        let mut config = self.data.write().await;

        if let Some(provider) = update.llm_provider {
            config.llm_provider = provider;
        }
        if let Some(llm) = update.llm_config {
            config.llm_config = Some(llm);
        }
        if let Some(image) = update.image_settings {
            config.image_settings = Some(image);
        }
        if let Some(days) = update.report_recent_days {
            config.report_recent_days = days;
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedAppConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageResolution, ImageSettings};

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/app_config.json");

        let manager = SettingsManager::new(path.clone()).await.unwrap();
        assert_eq!(manager.get().await.llm_provider, "gemini");

        manager
            .update(AppConfig {
                llm_provider: Some("openai".to_string()),
                llm_config: None,
                image_settings: Some(ImageSettings {
                    resolution: ImageResolution::QHD,
                    image_quality: 70,
                }),
                report_recent_days: Some(14),
            })
            .await
            .unwrap();

        // 重新打开后读到持久化的值
        let reopened = SettingsManager::new(path).await.unwrap();
        let config = reopened.get().await;
        assert_eq!(config.llm_provider, "openai");
        assert_eq!(config.report_recent_days, 14);
        assert_eq!(
            config.image_settings.map(|s| s.image_quality),
            Some(70)
        );
    }
}
