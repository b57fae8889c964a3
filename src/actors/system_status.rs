// System Status Actor - 使用Actor模式管理系统状态
//
// 用消息传递替代Arc<RwLock<SystemStatus>>，消除锁竞争

use crate::models::{StorageUsage, SystemStatus};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

/// 系统状态命令
pub enum SystemStatusCommand {
    /// 更新提取状态
    UpdateExtracting { is_extracting: bool },

    /// 更新最后提取时间
    UpdateLastExtractionTime { time: DateTime<Utc> },

    /// 更新最后条目写入时间
    UpdateLastEntryTime { time: DateTime<Utc> },

    /// 更新存储使用情况
    UpdateStorageUsage { usage: StorageUsage },

    /// 设置错误信息
    SetError { error: Option<String> },

    /// 获取状态
    Get { reply: oneshot::Sender<SystemStatus> },
}

/// 系统状态Actor
pub struct SystemStatusActor {
    receiver: mpsc::Receiver<SystemStatusCommand>,
    status: SystemStatus, // 无需RwLock
}

impl SystemStatusActor {
    /// 创建新的Actor
    pub fn new() -> (Self, SystemStatusHandle) {
        let (sender, receiver) = mpsc::channel(50);
        let actor = Self {
            receiver,
            status: SystemStatus::default(),
        };
        let handle = SystemStatusHandle { sender };
        (actor, handle)
    }

    /// 运行Actor
    pub async fn run(mut self) {
        tracing::info!("System Status Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SystemStatusCommand::UpdateExtracting { is_extracting } => {
                    self.status.is_extracting = is_extracting;
                    if is_extracting {
                        self.status.last_extraction_time = Some(Utc::now());
                    }
                }

                SystemStatusCommand::UpdateLastExtractionTime { time } => {
                    self.status.last_extraction_time = Some(time);
                }

                SystemStatusCommand::UpdateLastEntryTime { time } => {
                    self.status.last_entry_time = Some(time);
                }

                SystemStatusCommand::UpdateStorageUsage { usage } => {
                    self.status.storage_usage = usage;
                }

                SystemStatusCommand::SetError { error } => {
                    self.status.last_error = error;
                }

                SystemStatusCommand::Get { reply } => {
                    let _ = reply.send(self.status.clone());
                }
            }
        }

        tracing::info!("System Status Actor 已停止");
    }
}

/// 系统状态Handle
#[derive(Clone)]
pub struct SystemStatusHandle {
    sender: mpsc::Sender<SystemStatusCommand>,
}

impl SystemStatusHandle {
    /// 设置提取状态
    pub async fn set_extracting(&self, is_extracting: bool) {
        let _ = self
            .sender
            .send(SystemStatusCommand::UpdateExtracting { is_extracting })
            .await;
    }

    /// 更新最后提取时间
    pub async fn update_last_extraction_time(&self, time: DateTime<Utc>) {
        let _ = self
            .sender
            .send(SystemStatusCommand::UpdateLastExtractionTime { time })
            .await;
    }

    /// 更新最后条目写入时间
    pub async fn update_last_entry_time(&self, time: DateTime<Utc>) {
        let _ = self
            .sender
            .send(SystemStatusCommand::UpdateLastEntryTime { time })
            .await;
    }

    /// 更新存储使用情况
    pub async fn update_storage_usage(&self, usage: StorageUsage) {
        let _ = self
            .sender
            .send(SystemStatusCommand::UpdateStorageUsage { usage })
            .await;
    }

    /// 设置错误信息
    pub async fn set_error(&self, error: Option<String>) {
        let _ = self.sender.send(SystemStatusCommand::SetError { error }).await;
    }

    /// 获取系统状态
    pub async fn get(&self) -> SystemStatus {
        let (reply, rx) = oneshot::channel();
        self.sender.send(SystemStatusCommand::Get { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 健康检查 - Get命令能往返说明Actor在跑
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .sender
            .send(SystemStatusCommand::Get { reply })
            .await
            .is_err()
        {
            return false;
        }
        matches!(
            tokio::time::timeout(std::time::Duration::from_secs(5), rx).await,
            Ok(Ok(_))
        )
    }
}
