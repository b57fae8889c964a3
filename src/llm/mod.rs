// LLM模块 - 管理AI提取服务

pub mod gemini;
pub mod openai;
pub mod plugin;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use plugin::{
    parse_extraction_record, ExtractionProvider, ExtractionRecord, ProviderCapabilities,
    RecordKind,
};

use crate::storage::Database;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// 提取管理器
pub struct ExtractionManager {
    /// 当前使用的提供商
    provider: Box<dyn ExtractionProvider>,
    /// 配置锁
    config_lock: Arc<RwLock<ExtractionConfig>>,
    /// HTTP客户端（所有provider复用同一连接池）
    http_client: reqwest::Client,
    /// 数据库连接（切换provider后重新注入）
    db: Option<Arc<Database>>,
}

/// 提取服务配置
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractionConfig {
    /// 当前使用的 provider: "gemini" 或 "openai"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Gemini配置
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// OpenAI兼容配置
    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

/// Gemini配置
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_text_model")]
    pub text_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_text_model() -> String {
    "gemini-2.5-pro".to_string()
}

/// OpenAI兼容配置
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl ExtractionManager {
    /// 创建新的提取管理器（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: reqwest::Client) -> Self {
        // 默认使用 Gemini provider
        let provider: Box<dyn ExtractionProvider> = Box::new(GeminiProvider::new(client.clone()));

        Self {
            provider,
            config_lock: Arc::new(RwLock::new(ExtractionConfig::default())),
            http_client: client,
            db: None,
        }
    }

    /// 设置数据库连接，并注入到当前provider
    pub fn set_database(&mut self, db: Arc<Database>) {
        self.db = Some(db.clone());
        self.inject_database(db);
    }

    fn inject_database(&mut self, db: Arc<Database>) {
        // provider接口刻意不带存储概念，这里按具体类型注入
        if let Some(provider) = self.provider.as_any().downcast_mut::<GeminiProvider>() {
            provider.set_database(db);
        } else if let Some(provider) = self.provider.as_any().downcast_mut::<OpenAiProvider>() {
            provider.set_database(db);
        }
    }

    /// 应用配置（同时下发到对应provider）
    pub async fn configure(&mut self, config: ExtractionConfig) -> Result<()> {
        // provider变化时先切换实例
        let current = self.config_lock.read().await.provider.clone();
        if current != config.provider {
            self.switch_provider(&config.provider).await?;
        }

        match config.provider.as_str() {
            "gemini" => {
                info!("应用 Gemini 配置 (model={})", config.gemini.model);
                let provider_config = serde_json::json!({
                    "api_key": config.gemini.api_key,
                    "model": config.gemini.model,
                    "text_model": config.gemini.text_model,
                    "base_url": config.gemini.base_url,
                });
                self.provider.configure(provider_config)?;
            }
            "openai" => {
                info!("应用 OpenAI 配置 (model={})", config.openai.model);
                let provider_config = serde_json::json!({
                    "api_key": config.openai.api_key,
                    "model": config.openai.model,
                    "base_url": config.openai.base_url,
                });
                self.provider.configure(provider_config)?;
            }
            other => {
                warn!("未知的 provider: {}", other);
            }
        }

        let mut current_config = self.config_lock.write().await;
        *current_config = config;

        Ok(())
    }

    /// 切换 provider
    pub async fn switch_provider(&mut self, provider_name: &str) -> Result<()> {
        // 检查是否已经是目标 provider，避免重复创建实例
        let current = self.config_lock.read().await.provider.clone();
        if current == provider_name {
            info!("Provider 已经是 {}，无需切换", provider_name);
            return Ok(());
        }

        info!("切换提取 provider: {} -> {}", current, provider_name);

        match provider_name {
            "gemini" => {
                self.provider = Box::new(GeminiProvider::new(self.http_client.clone()));
            }
            "openai" => {
                self.provider = Box::new(OpenAiProvider::new(self.http_client.clone()));
            }
            _ => {
                return Err(anyhow!("不支持的 provider: {}", provider_name));
            }
        }

        // 新实例需要重新注入数据库
        if let Some(db) = self.db.clone() {
            self.inject_database(db);
        }

        let mut config = self.config_lock.write().await;
        config.provider = provider_name.to_string();

        info!("已切换到 provider: {}", provider_name);
        Ok(())
    }

    /// 分析图片
    pub async fn analyze_image(&self, image_jpeg: Vec<u8>) -> Result<ExtractionRecord> {
        self.provider.analyze_image(image_jpeg).await
    }

    /// 分析症状文本
    pub async fn analyze_text(&self, text: &str) -> Result<ExtractionRecord> {
        self.provider.analyze_text(text).await
    }

    /// 当前配置快照
    pub async fn get_config(&self) -> ExtractionConfig {
        self.config_lock.read().await.clone()
    }

    /// 当前provider名称
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// 当前provider是否已配置
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// 当前provider能力
    pub fn capabilities(&self) -> ProviderCapabilities {
        self.provider.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_switch_provider() {
        let mut manager = ExtractionManager::new(reqwest::Client::new());
        assert_eq!(manager.provider_name(), "gemini");

        manager.switch_provider("openai").await.unwrap();
        assert_eq!(manager.provider_name(), "openai");

        // 重复切换为空操作
        manager.switch_provider("openai").await.unwrap();
        assert_eq!(manager.provider_name(), "openai");

        assert!(manager.switch_provider("bedrock").await.is_err());
    }

    #[tokio::test]
    async fn test_configure_applies_provider_switch() {
        let mut manager = ExtractionManager::new(reqwest::Client::new());

        let config = ExtractionConfig {
            provider: "openai".to_string(),
            openai: OpenAiConfig {
                api_key: "sk-test".to_string(),
                model: default_openai_model(),
                base_url: None,
            },
            ..Default::default()
        };

        manager.configure(config).await.unwrap();
        assert_eq!(manager.provider_name(), "openai");
        assert!(manager.is_configured());
    }
}
