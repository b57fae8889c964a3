//! 应用程序初始化和启动
//!
//! 负责后端核心的完整启动流程，包括：
//! - 日志系统初始化
//! - 应用数据目录创建
//! - 各领域模块初始化
//! - Actor 系统启动

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::actors::{ExtractionActor, SystemStatusActor};
use crate::domains::{ExtractionDomain, StorageDomain, SystemDomain};
use crate::event_bus::EventBus;
use crate::llm::ExtractionManager;
use crate::logger::{self, LogBroadcaster};
use crate::scoring::HealthScoreEngine;
use crate::settings::SettingsManager;
use crate::storage::{Database, DatabaseConfig};
use crate::AppState;
use anyhow::Result;

/// 初始化应用后端
///
/// 展示壳在启动时调用一次，持有返回的 [`AppState`] 并经由 `api::` 模块访问。
/// 步骤：
/// 1. 日志系统初始化
/// 2. 数据目录与设置加载
/// 3. 数据库初始化（SQLite）
/// 4. Actor 系统启动
/// 5. 持久化的提取配置下发
pub async fn init(data_dir: impl Into<PathBuf>) -> Result<AppState> {
    let data_dir = data_dir.into();

    // 创建日志广播器并初始化日志系统（带推送功能）
    let log_broadcaster = Arc::new(LogBroadcaster::new());
    if let Err(e) = logger::init_with_broadcaster(log_broadcaster.clone()) {
        // 多次初始化（如嵌入式场景里宿主已装好subscriber）不视为致命错误
        eprintln!("日志系统初始化失败: {}", e);
    }

    info!("初始化照护记录后端...");

    let db_path = data_dir.join("data/care-octopus.db");
    let database = DatabaseConfig::SQLite {
        db_path: db_path.to_string_lossy().to_string(),
    };

    build_state(data_dir, database, log_broadcaster).await
}

/// 初始化临时档案（内存数据库，不落盘）
///
/// 用于测试和"访客模式"：进程退出后数据消失
pub async fn init_ephemeral() -> Result<AppState> {
    let data_dir = std::env::temp_dir().join(format!("care-octopus-{}", uuid::Uuid::new_v4()));
    let log_broadcaster = Arc::new(LogBroadcaster::new());
    build_state(data_dir, DatabaseConfig::Memory, log_broadcaster).await
}

/// 组装AppState：设置、数据库、Actor、领域管理器
async fn build_state(
    data_dir: PathBuf,
    database: DatabaseConfig,
    log_broadcaster: Arc<LogBroadcaster>,
) -> Result<AppState> {
    tokio::fs::create_dir_all(&data_dir).await?;

    // 设置管理器
    let settings = Arc::new(SettingsManager::new(data_dir.join("config/app_config.json")).await?);

    // 数据库
    let db = Arc::new(Database::new(&database).await?);
    info!("数据库就绪 (类型: {})", db.db_type());

    // HTTP客户端（读取环境代理，所有provider共享连接池）
    let http_client = crate::utils::proxy::build_http_client()?;

    // 提取管理器交给Actor独占，经handle访问
    let mut manager = ExtractionManager::new(http_client);
    manager.set_database(db.clone());
    let (extraction_actor, extraction_handle) = ExtractionActor::new(manager);
    tokio::spawn(extraction_actor.run());

    // 下发持久化的提取配置
    let persisted = settings.get().await;
    let extraction_config = crate::api::config::build_extraction_config(&persisted);
    if let Err(e) = extraction_handle.configure(extraction_config).await {
        warn!("应用持久化提取配置失败: {}", e);
    }

    // 系统状态Actor
    let (status_actor, status_handle) = SystemStatusActor::new();
    tokio::spawn(status_actor.run());

    // 事件总线
    let event_bus = Arc::new(EventBus::new(200));

    let state = AppState {
        extraction_domain: Arc::new(ExtractionDomain::new(extraction_handle)),
        storage_domain: Arc::new(StorageDomain::new(db, settings)),
        system_domain: Arc::new(SystemDomain::new(status_handle, log_broadcaster)),
        event_bus,
        score_engine: Arc::new(HealthScoreEngine::new()),
        data_dir,
    };

    // 启动时刷一次存储使用统计
    crate::api::query::refresh_storage_usage(&state).await;

    info!("照护记录后端初始化完成");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_ephemeral() {
        let state = init_ephemeral().await.unwrap();
        assert_eq!(state.storage_domain.get_db().db_type(), "memory");

        // Actor都在响应
        assert!(state.extraction_domain.get_handle().health_check().await);
        assert!(state.system_domain.get_status().health_check().await);
    }

    #[tokio::test]
    async fn test_init_with_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let state = init(dir.path()).await.unwrap();
        assert_eq!(state.storage_domain.get_db().db_type(), "sqlite");

        // 配置文件已生成
        assert!(dir.path().join("config/app_config.json").exists());
    }
}
