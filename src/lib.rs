// 照护记录应用核心后端
//
// 捕获(照片/语音文本) -> LLM结构化提取 -> 用户确认入库 -> 健康评分与报告。
// 展示壳（桌面或网页前端）通过 `app::init` 拿到 AppState，再经 `api::` 调用

// 声明模块
pub mod actors;
pub mod api;
pub mod app;
pub mod domains;
pub mod event_bus;
pub mod llm;
pub mod logger;
pub mod models;
pub mod report;
pub mod scoring;
pub mod settings;
pub mod storage;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use domains::{ExtractionDomain, StorageDomain, SystemDomain};
use event_bus::EventBus;
use scoring::HealthScoreEngine;

// 常用类型的重新导出
pub use event_bus::AppEvent;
pub use llm::{ExtractionRecord, RecordKind};
pub use models::{ApiResponse, AppConfig, PersistedAppConfig};
pub use scoring::{CareStatus, ScoreReport};
pub use storage::{CareEntry, EntryKind, NewEntry, Severity};

/// 应用状态（按领域分组）
///
/// - 提取领域：LLM提取服务
/// - 存储领域：数据库和设置管理
/// - 系统领域：系统状态和日志推送
/// - 事件总线：用于领域间解耦通信
/// - 评分引擎：无状态纯计算，全局共享一个实例
#[derive(Clone)]
pub struct AppState {
    /// 提取领域管理器
    pub extraction_domain: Arc<ExtractionDomain>,
    /// 存储领域管理器
    pub storage_domain: Arc<StorageDomain>,
    /// 系统领域管理器
    pub system_domain: Arc<SystemDomain>,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
    /// 健康评分引擎
    pub score_engine: Arc<HealthScoreEngine>,
    /// 数据目录（导出等文件默认落在这里）
    pub data_dir: PathBuf,
}
