// 数据模型定义 - 数据库实体结构

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 把时间格式化为统一的RFC3339字符串（毫秒精度，Z后缀）
/// 同一格式下字符串排序与时间排序一致，可直接用于TEXT列排序
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析条目时间戳（RFC3339）
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Medication, // 用药记录
    Symptom,    // 症状记录
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medication => "medication",
            Self::Symptom => "symptom",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "medication" => Some(Self::Medication),
            "symptom" => Some(Self::Symptom),
            _ => None,
        }
    }
}

/// 症状严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// 照护条目 - 一条已确认的用药或症状记录
///
/// 条目一经写入不可修改，只能整库清空。`kind`/`severity`以字符串落库，
/// 类型化校验在写入边界和评分引擎内各自完成
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CareEntry {
    /// 唯一ID（UUID v4，写入时分配）
    pub id: String,
    /// 条目类型: medication | symptom
    pub kind: String,
    /// 简短标题
    pub title: String,
    /// 详细描述
    pub details: String,
    /// 创建时间（RFC3339，写入时分配，不可变）
    pub timestamp: String,
    /// 严重程度: low | medium | high（可选）
    pub severity: Option<String>,
    /// 提取服务给出的医疗提示（可选）
    pub warning: Option<String>,
}

impl CareEntry {
    /// 解析类型化的条目种类
    pub fn entry_kind(&self) -> Option<EntryKind> {
        EntryKind::parse(&self.kind)
    }

    /// 解析类型化的严重程度
    pub fn severity_level(&self) -> Option<Severity> {
        self.severity.as_deref().and_then(Severity::parse)
    }
}

/// 新条目输入 - id和timestamp由存储层分配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub kind: EntryKind,
    pub title: String,
    pub details: String,
    pub severity: Option<Severity>,
    pub warning: Option<String>,
}

/// 提取调用记录 - 每次LLM提取请求的审计信息
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractionCallRecord {
    pub id: Option<i64>,
    pub provider: String, // gemini, openai等
    pub model: String,
    pub call_type: String, // analyze_image, analyze_text
    pub request_body: String, // JSON格式的请求体（图片数据已脱敏）
    pub response_body: Option<String>, // 响应内容
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
    pub latency_ms: Option<i64>,     // 调用延迟（毫秒）
    pub token_usage: Option<String>, // JSON格式的token使用情况
    pub created_at: DateTime<Utc>,
}

/// 存储统计信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// 条目数量
    pub entry_count: i64,
    /// 提取调用记录数量
    pub extraction_call_count: i64,
    /// 数据库文件大小（字节，内存库为0）
    pub database_size: i64,
}
