// Google Gemini提供商实现 - 药品标签与症状文本的结构化提取

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

/// Gemini提供商（Google Generative Language API）
pub struct GeminiProvider {
    api_key: Option<String>,
    /// 图像分析模型
    image_model: String,
    /// 文本分析模型（症状描述用推理更强的型号）
    text_model: String,
    client: Client,
    base_url: String,
    db: Option<Arc<crate::storage::Database>>,
    /// 最近一次提取调用记录ID
    last_call_ids: Mutex<HashMap<String, i64>>,
}

impl GeminiProvider {
    /// 创建新的Gemini提供商（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: Client) -> Self {
        Self {
            api_key: None,
            image_model: "gemini-2.5-flash".to_string(),
            text_model: "gemini-2.5-pro".to_string(),
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            db: None,
            last_call_ids: Mutex::new(HashMap::new()),
        }
    }

    /// 设置数据库连接（用于记录提取调用）
    pub fn set_database(&mut self, db: Arc<crate::storage::Database>) {
        self.db = Some(db);
    }

    /// 设置API密钥
    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
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

    /// 调用Gemini generateContent接口
    ///
    /// `parts` 是消息内容数组；`redacted_parts` 用于审计记录（图片数据脱敏后的版本）
    async fn call_gemini_api(
        &self,
        model: &str,
        parts: Vec<Value>,
        redacted_parts: Vec<Value>,
        call_type: &str,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Gemini API key未配置"))?;

        let start_time = std::time::Instant::now();

        self.reset_call_id(call_type);

        let request_body = json!({
            "contents": [
                {
                    "parts": parts
                }
            ],
            "generationConfig": {
                "temperature": 0.3,
                "responseMimeType": "application/json"  // 保证结构化输出
            }
        });

        debug!("调用Gemini API: model={}, base_url={}", model, self.base_url);

        // 记录请求信息（图片数据不入库）
        let mut call_record = crate::storage::ExtractionCallRecord {
            id: None,
            provider: "gemini".to_string(),
            model: model.to_string(),
            call_type: call_type.to_string(),
            request_body: json!({
                "contents": [{ "parts": redacted_parts }],
                "generationConfig": { "temperature": 0.3, "responseMimeType": "application/json" }
            })
            .to_string(),
            response_body: None,
            status_code: None,
            error_message: None,
            latency_ms: None,
            token_usage: None,
            created_at: chrono::Utc::now(),
        };

        let endpoint = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status_code = response.status().as_u16() as i32;
        call_record.status_code = Some(status_code);

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("Gemini API错误: {}", error_text);
            call_record.error_message = Some(truncate_for_log(&error_text, 2000));
            call_record.latency_ms = Some(start_time.elapsed().as_millis() as i64);

            // 保存错误记录
            if let Some(ref db) = self.db {
                if let Err(e) = db.insert_extraction_call(&call_record).await {
                    error!("保存提取调用记录失败: {}", e);
                }
            }

            return Err(anyhow::anyhow!("Gemini API调用失败: {}", error_text));
        }

        let response_text = response.text().await?;

        // 解析响应
        let response_data: GeminiResponse = serde_json::from_str(&response_text)?;

        // 记录成功的响应
        call_record.response_body = Some(truncate_for_log(&response_text, 4000));
        call_record.latency_ms = Some(start_time.elapsed().as_millis() as i64);

        // 提取token使用信息
        if let Ok(response_json) = serde_json::from_str::<Value>(&response_text) {
            if let Some(usage) = response_json.get("usageMetadata") {
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

        let candidate = response_data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Gemini响应中没有候选内容"))?;

        // MAX_TOKENS等非正常结束时不要把半截JSON往下传
        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                return Err(anyhow::anyhow!("Gemini响应非正常结束: {}", reason));
            }
        }

        let content = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(anyhow::anyhow!("Gemini返回了空内容"));
        }

        Ok(content)
    }
}

#[async_trait]
impl ExtractionProvider for GeminiProvider {
    fn as_any(&mut self) -> &mut dyn std::any::Any {
        self
    }

    async fn analyze_image(&self, image_jpeg: Vec<u8>) -> Result<ExtractionRecord> {
        if !self.is_configured() {
            return Err(anyhow::anyhow!("Gemini API key未配置，请先配置 API key"));
        }

        info!("Gemini开始分析图片 ({} 字节)", image_jpeg.len());

        let image_base64 = general_purpose::STANDARD.encode(&image_jpeg);
        let prompt = build_image_prompt();

        let parts = vec![
            json!({ "text": prompt }),
            json!({
                "inline_data": {
                    "mime_type": "image/jpeg",
                    "data": image_base64
                }
            }),
        ];
        let redacted_parts = vec![
            json!({ "text": prompt }),
            json!({ "inline_data": { "mime_type": "image/jpeg", "data": "<redacted>" } }),
        ];

        let response = self
            .call_gemini_api(&self.image_model, parts, redacted_parts, "analyze_image")
            .await?;

        parse_extraction_record(&response)
    }

    async fn analyze_text(&self, text: &str) -> Result<ExtractionRecord> {
        if !self.is_configured() {
            return Err(anyhow::anyhow!("Gemini API key未配置，请先配置 API key"));
        }

        info!("Gemini开始分析症状文本 ({} 字符)", text.chars().count());

        let prompt = build_text_prompt(text);
        let parts = vec![json!({ "text": prompt })];
        let redacted_parts = parts.clone();

        let response = self
            .call_gemini_api(&self.text_model, parts, redacted_parts, "analyze_text")
            .await?;

        parse_extraction_record(&response)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn configure(&mut self, config: serde_json::Value) -> Result<()> {
        if let Some(api_key) = config.get("api_key").and_then(|v| v.as_str()) {
            if !api_key.is_empty() {
                self.api_key = Some(api_key.to_string());
            }
        }
        if let Some(model) = config.get("model").and_then(|v| v.as_str()) {
            if !model.is_empty() {
                self.image_model = model.to_string();
            }
        }
        if let Some(model) = config.get("text_model").and_then(|v| v.as_str()) {
            if !model.is_empty() {
                self.text_model = model.to_string();
            }
        }
        if let Some(base_url) = config.get("base_url").and_then(|v| v.as_str()) {
            if !base_url.is_empty() {
                self.base_url = base_url.trim_end_matches('/').to_string();
            }
        }
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_ref().map(|k| !k.is_empty()).unwrap_or(false)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            vision_support: true,
            max_input_tokens: 1_000_000,
            supported_image_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

/// Gemini API响应结构
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_and_is_configured() {
        let mut provider = GeminiProvider::new(Client::new());
        assert!(!provider.is_configured());

        provider
            .configure(serde_json::json!({
                "api_key": "test-key",
                "model": "gemini-2.5-flash",
                "base_url": "https://example.com/v1beta/"
            }))
            .unwrap();

        assert!(provider.is_configured());
        assert_eq!(provider.base_url, "https://example.com/v1beta");
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "{\"type\":\"symptom\"}" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 42 }
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(
            parsed.candidates[0].content.parts[0].text.as_deref(),
            Some("{\"type\":\"symptom\"}")
        );
    }
}
