// Extraction Actor - 使用Actor模式管理提取服务状态
//
// 用消息传递替代锁机制，消除Arc<Mutex<ExtractionManager>>的锁竞争

use crate::llm::{ExtractionConfig, ExtractionManager, ExtractionRecord};
use crate::storage::Database;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// 提取管理器命令
pub enum ExtractionCommand {
    /// 应用配置
    Configure {
        config: ExtractionConfig,
        reply: oneshot::Sender<Result<()>>,
    },

    /// 分析图片
    AnalyzeImage {
        image_jpeg: Vec<u8>,
        reply: oneshot::Sender<Result<ExtractionRecord>>,
    },

    /// 分析症状文本
    AnalyzeText {
        text: String,
        reply: oneshot::Sender<Result<ExtractionRecord>>,
    },

    /// 获取配置
    GetConfig {
        reply: oneshot::Sender<ExtractionConfig>,
    },

    /// 切换 provider
    SwitchProvider {
        provider: String,
        reply: oneshot::Sender<Result<()>>,
    },

    /// 设置provider的数据库连接
    SetDatabase { db: Arc<Database> },

    /// 健康检查（Ping）
    HealthCheck { reply: oneshot::Sender<()> },
}

/// Extraction Actor（无需外层Mutex）
pub struct ExtractionActor {
    receiver: mpsc::Receiver<ExtractionCommand>,
    manager: ExtractionManager, // 直接持有，无需锁
}

impl ExtractionActor {
    /// 创建新的Actor
    pub fn new(manager: ExtractionManager) -> (Self, ExtractionHandle) {
        let (sender, receiver) = mpsc::channel(100);
        let actor = Self { receiver, manager };
        let handle = ExtractionHandle { sender };
        (actor, handle)
    }

    /// 运行Actor（在单独的任务中运行）
    pub async fn run(mut self) {
        tracing::info!("Extraction Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ExtractionCommand::Configure { config, reply } => {
                    let result = self.manager.configure(config).await;
                    let _ = reply.send(result);
                }

                ExtractionCommand::AnalyzeImage { image_jpeg, reply } => {
                    let result = self.manager.analyze_image(image_jpeg).await;
                    let _ = reply.send(result);
                }

                ExtractionCommand::AnalyzeText { text, reply } => {
                    let result = self.manager.analyze_text(&text).await;
                    let _ = reply.send(result);
                }

                ExtractionCommand::GetConfig { reply } => {
                    let config = self.manager.get_config().await;
                    let _ = reply.send(config);
                }

                ExtractionCommand::SwitchProvider { provider, reply } => {
                    let result = self.manager.switch_provider(&provider).await;
                    let _ = reply.send(result);
                }

                ExtractionCommand::SetDatabase { db } => {
                    self.manager.set_database(db);
                }

                ExtractionCommand::HealthCheck { reply } => {
                    // 立即响应，表明Actor正常运行
                    let _ = reply.send(());
                }
            }
        }

        tracing::info!("Extraction Actor 已停止");
    }
}

/// Extraction Handle（用于与Actor通信，可克隆）
#[derive(Clone)]
pub struct ExtractionHandle {
    sender: mpsc::Sender<ExtractionCommand>,
}

impl ExtractionHandle {
    /// 应用配置
    pub async fn configure(&self, config: ExtractionConfig) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ExtractionCommand::Configure { config, reply })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        rx.await.map_err(|_| anyhow::anyhow!("Actor已停止"))?
    }

    /// 分析图片
    pub async fn analyze_image(&self, image_jpeg: Vec<u8>) -> Result<ExtractionRecord> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ExtractionCommand::AnalyzeImage { image_jpeg, reply })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        rx.await.map_err(|_| anyhow::anyhow!("Actor已停止"))?
    }

    /// 分析症状文本
    pub async fn analyze_text(&self, text: &str) -> Result<ExtractionRecord> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ExtractionCommand::AnalyzeText {
                text: text.to_string(),
                reply,
            })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        rx.await.map_err(|_| anyhow::anyhow!("Actor已停止"))?
    }

    /// 获取配置
    pub async fn get_config(&self) -> Result<ExtractionConfig> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ExtractionCommand::GetConfig { reply })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        rx.await.map_err(|_| anyhow::anyhow!("Actor已停止"))
    }

    /// 切换 provider
    pub async fn switch_provider(&self, provider: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(ExtractionCommand::SwitchProvider {
                provider: provider.to_string(),
                reply,
            })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        rx.await.map_err(|_| anyhow::anyhow!("Actor已停止"))?
    }

    /// 设置provider的数据库连接
    pub async fn set_database(&self, db: Arc<Database>) -> Result<()> {
        self.sender
            .send(ExtractionCommand::SetDatabase { db })
            .await
            .map_err(|_| anyhow::anyhow!("Actor通道已关闭"))?;
        Ok(())
    }

    /// 健康检查
    /// 返回true表示Actor正常运行，false表示Actor无响应或已停止
    /// 超时时间为5秒
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();

        if self
            .sender
            .send(ExtractionCommand::HealthCheck { reply })
            .await
            .is_err()
        {
            tracing::warn!("Extraction Actor 健康检查失败: 通道已关闭");
            return false;
        }

        match tokio::time::timeout(std::time::Duration::from_secs(5), rx).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                tracing::warn!("Extraction Actor 健康检查失败: Actor已停止");
                false
            }
            Err(_) => {
                tracing::warn!("Extraction Actor 健康检查失败: 超时(5秒)");
                false
            }
        }
    }
}
