// 数据模型模块 - 定义所有的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 重新导出其他模块的类型
pub use crate::llm::{ExtractionConfig, ExtractionRecord, GeminiConfig, OpenAiConfig, RecordKind};
pub use crate::scoring::{CareStatus, ScoreReport};
pub use crate::storage::{CareEntry, EntryKind, NewEntry, Severity, StoreStats};

/// 应用配置（增量更新用，None表示保持不变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 提取提供商
    pub llm_provider: Option<String>,
    /// 提取配置
    pub llm_config: Option<LLMProviderConfig>,
    /// 图片归一化配置
    pub image_settings: Option<ImageSettings>,
    /// 近期报告窗口（天）
    pub report_recent_days: Option<i64>,
}

/// 持久化的应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAppConfig {
    /// 提取提供商
    pub llm_provider: String,
    /// 近期报告窗口（天）
    pub report_recent_days: i64,
    /// 提取配置
    pub llm_config: Option<LLMProviderConfig>,
    /// 图片归一化配置
    pub image_settings: Option<ImageSettings>,
}

impl Default for PersistedAppConfig {
    fn default() -> Self {
        Self {
            llm_provider: "gemini".to_string(),
            report_recent_days: 30,
            llm_config: None,
            image_settings: Some(ImageSettings::default()),
        }
    }
}

/// 提取提供商配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// API密钥
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// API基础URL
    pub base_url: String,
}

/// 图片归一化设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSettings {
    /// 上传前的图片分辨率上限
    pub resolution: ImageResolution,
    /// 图片质量(1-100)
    pub image_quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            resolution: ImageResolution::FHD,
            image_quality: 85,
        }
    }
}

/// 图片分辨率枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageResolution {
    #[serde(rename = "1080p")]
    FHD, // 1920x1080 (Full HD)
    #[serde(rename = "2k")]
    QHD, // 2560x1440 (2K/Quad HD)
    #[serde(rename = "4k")]
    UHD, // 3840x2160 (4K/Ultra HD)
    #[serde(rename = "original")]
    Original, // 原始分辨率
}

impl ImageResolution {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::FHD => Some((1920, 1080)),
            Self::QHD => Some((2560, 1440)),
            Self::UHD => Some((3840, 2160)),
            Self::Original => None,
        }
    }
}

/// 系统状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    /// 是否正在提取
    pub is_extracting: bool,
    /// 最后提取时间
    pub last_extraction_time: Option<DateTime<Utc>>,
    /// 最后条目写入时间
    pub last_entry_time: Option<DateTime<Utc>>,
    /// 存储使用情况
    pub storage_usage: StorageUsage,
    /// 错误信息
    pub last_error: Option<String>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            is_extracting: false,
            last_extraction_time: None,
            last_entry_time: None,
            storage_usage: StorageUsage::default(),
            last_error: None,
        }
    }
}

/// 存储使用情况
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    /// 数据库大小（字节）
    pub database_size: u64,
    /// 条目数量
    pub entry_count: u32,
    /// 提取调用记录数量
    pub extraction_call_count: u32,
}

/// 日期范围
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

/// 导出请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// 报告范围
    pub scope: ExportScope,
    /// 导出格式
    pub format: ExportFormat,
    /// 输出目录（缺省用数据目录下的 exports/）
    pub output_dir: Option<String>,
}

/// 导出范围
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportScope {
    /// 最近N天（N取配置里的 report_recent_days）
    Recent,
    /// 指定月份 (格式: YYYY-MM)
    Month { month: String },
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// API响应包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}
