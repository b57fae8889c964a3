// OpenAI兼容提供商实现 - 走 chat/completions 接口的备用提取通道

use super::plugin::*;
use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// OpenAI兼容提供商 - 任何实现 chat/completions 的服务都可接入
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
    client: Client,
    base_url: String,
    db: Option<Arc<crate::storage::Database>>,
    /// 最近一次提取调用记录ID
    last_call_ids: Mutex<HashMap<String, i64>>,
}

impl OpenAiProvider {
    /// 创建新的OpenAI兼容提供商（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: Client) -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            client,
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            db: None,
            last_call_ids: Mutex::new(HashMap::new()),
        }
    }

    /// 设置数据库连接（用于记录提取调用）
    pub fn set_database(&mut self, db: Arc<crate::storage::Database>) {
        self.db = Some(db);
    }

    fn reset_call_id(&self, call_type: &str) {
        if let Ok(mut map) = self.last_call_ids.lock() {
            map.remove(call_type);
        }
    }

    fn record_call_id(&self, call_type: &str, id: i64) {
        if let Ok(mut map) = self.last_call_ids.lock() {
            map.insert(call_type.to_string(), id);
        }
    }

    pub fn last_call_id(&self, call_type: &str) -> Option<i64> {
        self.last_call_ids
            .lock()
            .ok()
            .and_then(|map| map.get(call_type).copied())
    }

    /// 调用 chat/completions 接口
    async fn call_chat_api(
        &self,
        content_parts: Vec<Value>,
        redacted_parts: Vec<Value>,
        call_type: &str,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key未配置"))?;

        let start_time = std::time::Instant::now();

        self.reset_call_id(call_type);

        let request_body = json!({
            "model": self.model,
            "response_format": {"type": "json_object"},  // 保证结构化输出
            "messages": [
                {
                    "role": "user",
                    "content": content_parts
                }
            ],
            "max_tokens": 2000,
            "temperature": 0.3
        });

        debug!(
            "调用OpenAI兼容API: model={}, base_url={}",
            self.model, self.base_url
        );

        // 记录请求信息（图片数据不入库）
        let mut call_record = crate::storage::ExtractionCallRecord {
            id: None,
            provider: "openai".to_string(),
            model: self.model.clone(),
            call_type: call_type.to_string(),
            request_body: json!({
                "model": self.model,
                "response_format": {"type": "json_object"},
                "messages": [{ "role": "user", "content": redacted_parts }],
                "max_tokens": 2000,
                "temperature": 0.3
            })
            .to_string(),
            response_body: None,
            status_code: None,
            error_message: None,
            latency_ms: None,
            token_usage: None,
            created_at: chrono::Utc::now(),
        };

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status_code = response.status().as_u16() as i32;
        call_record.status_code = Some(status_code);

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("OpenAI API错误: {}", error_text);
            call_record.error_message = Some(truncate_for_log(&error_text, 2000));
            call_record.latency_ms = Some(start_time.elapsed().as_millis() as i64);

            // 保存错误记录
            if let Some(ref db) = self.db {
                if let Err(e) = db.insert_extraction_call(&call_record).await {
                    error!("保存提取调用记录失败: {}", e);
                }
            }

            return Err(anyhow::anyhow!("OpenAI API调用失败: {}", error_text));
        }

        let response_text = response.text().await?;

        // 解析响应
        let response_data: ChatResponse = serde_json::from_str(&response_text)?;

        // 记录成功的响应
        call_record.response_body = Some(truncate_for_log(&response_text, 4000));
        call_record.latency_ms = Some(start_time.elapsed().as_millis() as i64);

        // 提取token使用信息
        if let Ok(response_json) = serde_json::from_str::<Value>(&response_text) {
            if let Some(usage) = response_json.get("usage") {
                call_record.token_usage = Some(usage.to_string());
            }
        }

        // 保存成功记录
        if let Some(ref db) = self.db {
            match db.insert_extraction_call(&call_record).await {
                Ok(id) => self.record_call_id(call_type, id),
                Err(e) => error!("保存提取调用记录失败: {}", e),
            }
        }

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("OpenAI响应中没有choices"))?;

        // 达到token限制时返回错误而不是不完整的JSON
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(anyhow::anyhow!(
                "LLM响应被截断（达到 max_tokens 限制），内容长度: {} 字符",
                choice.message.content.len()
            ));
        }

        Ok(choice.message.content)
    }
}

#[async_trait]
impl ExtractionProvider for OpenAiProvider {
    fn as_any(&mut self) -> &mut dyn std::any::Any {
        self
    }

    async fn analyze_image(&self, image_jpeg: Vec<u8>) -> Result<ExtractionRecord> {
        if !self.is_configured() {
            return Err(anyhow::anyhow!("OpenAI API key未配置，请先配置 API key"));
        }

        info!("OpenAI开始分析图片 ({} 字节)", image_jpeg.len());

        let image_base64 = general_purpose::STANDARD.encode(&image_jpeg);
        let prompt = build_image_prompt();

        let content_parts = vec![
            json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:image/jpeg;base64,{}", image_base64)
                }
            }),
            json!({ "type": "text", "text": prompt }),
        ];
        let redacted_parts = vec![
            json!({ "type": "image_url", "image_url": { "url": "<redacted>" } }),
            json!({ "type": "text", "text": prompt }),
        ];

        let response = self
            .call_chat_api(content_parts, redacted_parts, "analyze_image")
            .await?;

        parse_extraction_record(&response)
    }

    async fn analyze_text(&self, text: &str) -> Result<ExtractionRecord> {
        if !self.is_configured() {
            return Err(anyhow::anyhow!("OpenAI API key未配置，请先配置 API key"));
        }

        info!("OpenAI开始分析症状文本 ({} 字符)", text.chars().count());

        let prompt = build_text_prompt(text);
        let content_parts = vec![json!({ "type": "text", "text": prompt })];
        let redacted_parts = content_parts.clone();

        let response = self
            .call_chat_api(content_parts, redacted_parts, "analyze_text")
            .await?;

        parse_extraction_record(&response)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn configure(&mut self, config: serde_json::Value) -> Result<()> {
        if let Some(api_key) = config.get("api_key").and_then(|v| v.as_str()) {
            if !api_key.is_empty() {
                self.api_key = Some(api_key.to_string());
            }
        }
        if let Some(model) = config.get("model").and_then(|v| v.as_str()) {
            if !model.is_empty() {
                self.model = model.to_string();
            }
        }
        if let Some(base_url) = config.get("base_url").and_then(|v| v.as_str()) {
            if !base_url.is_empty() {
                self.base_url = base_url.to_string();
            }
        }
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_ref().map(|k| !k.is_empty()).unwrap_or(false)
    }
}

/// chat/completions 响应结构
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_overrides_defaults() {
        let mut provider = OpenAiProvider::new(Client::new());
        provider
            .configure(serde_json::json!({
                "api_key": "sk-test",
                "model": "gpt-4o",
                "base_url": "https://proxy.example.com/v1/chat/completions"
            }))
            .unwrap();

        assert!(provider.is_configured());
        assert_eq!(provider.model, "gpt-4o");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{
            "choices": [{
                "message": { "content": "{\"type\":\"medication\"}" },
                "finish_reason": "stop"
            }],
            "usage": { "total_tokens": 100 }
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"type\":\"medication\"}");
    }
}
