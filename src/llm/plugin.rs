// 提取插件系统 - 定义提供商接口和数据结构

use crate::storage::models::Severity;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use llm_json::{loads, repair_json, RepairOptions};
use serde::{
    de::Deserializer,
    Deserialize, Serialize,
};
use serde_json::Value;

/// 提取记录的类别
///
/// 图像分析会返回 medication/report，文本分析返回 symptom。
/// report（体检报告、化验单等）在确认保存时归入 symptom 类条目
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Medication,
    Report,
    Symptom,
}

/// 提取记录 - LLM从图片或文本中抽取的结构化结果
///
/// 这是确认保存之前的中间形态，所有字段都按宽松规则反序列化，
/// 再经 `validate` 做schema校验，不合规的载荷在边界被拒绝
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// 类别
    #[serde(rename = "type", deserialize_with = "deserialize_record_kind")]
    pub kind: RecordKind,
    /// 简短标题（药品名/报告名/症状名）
    pub title: String,
    /// 详情（剂量频次/报告摘要/症状描述）
    pub details: String,
    /// 严重程度（文本分析时返回）
    #[serde(default, deserialize_with = "deserialize_severity")]
    pub severity: Option<Severity>,
    /// 医疗提示（副作用、警告、就医建议）
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub warning: Option<String>,
    /// 置信度 0-100（图像分析时返回）
    #[serde(default, deserialize_with = "deserialize_confidence")]
    pub confidence: Option<f32>,
}

impl ExtractionRecord {
    /// 边界校验 - 拒绝不合规的LLM载荷而不是带病入库
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("提取结果缺少标题".to_string());
        }
        if self.details.trim().is_empty() {
            return Err("提取结果缺少详情".to_string());
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=100.0).contains(&confidence) {
                return Err(format!("置信度超出范围: {}", confidence));
            }
        }
        Ok(())
    }
}

/// 类别反序列化（容忍大小写差异）
fn deserialize_record_kind<'de, D>(deserializer: D) -> Result<RecordKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "medication" => Ok(RecordKind::Medication),
        "report" => Ok(RecordKind::Report),
        "symptom" => Ok(RecordKind::Symptom),
        other => Err(serde::de::Error::custom(format!(
            "未知的提取记录类别: {}",
            other
        ))),
    }
}

/// 严重程度反序列化（容忍大小写和null）
fn deserialize_severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Severity::parse(&s)),
        _ => Ok(None),
    }
}

/// 可选文本反序列化 - LLM偶尔返回字符串"null"/"none"，按缺失处理
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("none") {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(other) => Ok(Some(other.to_string())),
    }
}

/// 置信度反序列化 - 数字或数字字符串均接受
fn deserialize_confidence<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64().map(|v| v as f32)),
        Some(Value::String(s)) => Ok(s.trim().parse::<f32>().ok()),
        _ => Ok(None),
    }
}

/// 解析LLM返回的提取记录
///
/// 先严格解析，失败时剥掉代码围栏再做JSON修复。
/// 结构仍不符合预期时向调用方报错
pub fn parse_extraction_record(raw: &str) -> Result<ExtractionRecord> {
    let cleaned = strip_code_fence(raw.trim());
    if cleaned.is_empty() {
        return Err(anyhow!("LLM没有返回内容"));
    }

    if let Ok(record) = serde_json::from_str::<ExtractionRecord>(&cleaned) {
        return Ok(record);
    }

    let repaired = repair_json(&cleaned, &RepairOptions::default())
        .map_err(|e| anyhow!("无法修复LLM返回的JSON: {}", e))?;
    let value = loads(&repaired, &RepairOptions::default())
        .map_err(|e| anyhow!("解析修复后的JSON失败: {}", e))?;
    serde_json::from_value(value).map_err(|e| anyhow!("JSON结构不符合预期: {}", e))
}

/// 剥掉 ```json ... ``` 代码围栏
pub(crate) fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let mut lines = trimmed.lines();
        // 跳过 ```json 或 ``` 开头
        lines.next();
        let mut body = Vec::new();
        for line in lines {
            if line.trim_start().starts_with("```") {
                break;
            }
            body.push(line);
        }
        body.join("\n")
    } else {
        trimmed.to_string()
    }
}

/// 日志用截断
pub(crate) fn truncate_for_log(input: &str, max_len: usize) -> String {
    if input.len() <= max_len {
        input.to_string()
    } else {
        let mut truncated = input[..max_len].to_string();
        truncated.push_str("...<truncated>");
        truncated
    }
}

/// 构建图像分析提示词（药品标签/医疗报告）
pub(crate) fn build_image_prompt() -> String {
    r#"You are CareOctopus, an expert medical assistant.
Analyze this image of a medication label or medical report.

Extract the following information and return it in strict JSON format:
{
  "type": "medication" or "report",
  "title": "Name of drug or report title",
  "details": "Dosage/Frequency or Summary of report",
  "warning": "Any side effects or warnings (if medication) or key alerts (if report)",
  "confidence": 0-100
}
Do not include markdown code blocks. Just the raw JSON string."#
        .to_string()
}

/// 构建症状文本分析提示词
pub(crate) fn build_text_prompt(text: &str) -> String {
    format!(
        r#"You are CareOctopus. Analyze this symptom description: "{}"

Return valid JSON only:
{{
  "type": "symptom",
  "title": "Short title (e.g. Dizziness, Nausea)",
  "details": "Summary of the complaint",
  "severity": "low" | "medium" | "high",
  "warning": "Medical advice if severity is high (otherwise null)"
}}
Do not include markdown formatting."#,
        text
    )
}

/// 提取提供商接口
#[async_trait]
pub trait ExtractionProvider: Send + Sync + std::any::Any {
    /// 转换为Any trait（用于向下转型）
    fn as_any(&mut self) -> &mut dyn std::any::Any;

    /// 分析图片（药品标签或医疗报告）
    ///
    /// # 参数
    /// * `image_jpeg` - 已归一化的JPEG图片数据
    ///
    /// # 返回
    /// * 结构化提取记录
    async fn analyze_image(&self, image_jpeg: Vec<u8>) -> Result<ExtractionRecord>;

    /// 分析症状文本
    async fn analyze_text(&self, text: &str) -> Result<ExtractionRecord>;

    /// 获取提供商名称
    fn name(&self) -> &str;

    /// 配置提供商
    ///
    /// # 参数
    /// * `config` - JSON格式的配置
    fn configure(&mut self, config: serde_json::Value) -> Result<()>;

    /// 检查提供商是否已配置
    fn is_configured(&self) -> bool;

    /// 获取支持的功能
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }
}

/// 提供商能力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// 是否支持视觉分析
    pub vision_support: bool,
    /// 最大输入token数
    pub max_input_tokens: usize,
    /// 支持的图片格式
    pub supported_image_formats: Vec<String>,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            vision_support: true,
            max_input_tokens: 128000,
            supported_image_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}
