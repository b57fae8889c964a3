// 事件总线 - 用于模块间解耦通信
//
// 实现发布/订阅模式,消除模块间的直接依赖关系
// 使用 tokio::sync::broadcast 实现高效的事件分发

use crate::scoring::CareStatus;
use tokio::sync::broadcast;

/// 应用事件枚举 - 定义所有可能的系统事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    // --- 提取事件 ---

    /// 提取开始事件
    ExtractionStarted {
        call_type: String,
    },

    /// 提取完成事件
    ExtractionCompleted {
        call_type: String,
        title: String,
    },

    /// 提取失败事件
    ExtractionFailed {
        call_type: String,
        error: String,
    },

    // --- 存储事件 ---

    /// 条目写入事件
    EntrySaved {
        entry_id: String,
        kind: String,
    },

    /// 条目清空事件
    EntriesCleared {
        removed: u64,
    },

    // --- 评分事件 ---

    /// 评分更新事件
    ScoreUpdated {
        score: u8,
        status: CareStatus,
    },

    // --- 系统事件 ---

    /// 配置更新事件
    ConfigUpdated {
        config_type: String,
    },

    /// 报告导出完成事件
    ReportExported {
        path: String,
    },
}

/// 事件总线 - 用于模块间解耦通信
///
/// 使用 broadcast channel 实现发布/订阅模式
/// 支持多个订阅者同时接收事件
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小,建议 100-1000
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 如果没有订阅者,事件会被丢弃(这是正常的)
    pub fn publish(&self, event: AppEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) => {
                // 没有订阅者,忽略错误
                tracing::trace!("事件已发布但无订阅者");
            }
        }
    }

    /// 订阅事件
    ///
    /// 返回一个接收器,可以用 `.recv().await` 接收事件
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_basic() {
        let bus = EventBus::new(100);

        // 订阅事件
        let mut receiver = bus.subscribe();

        // 发布事件
        bus.publish(AppEvent::ExtractionStarted {
            call_type: "analyze_text".to_string(),
        });

        // 接收事件
        match receiver.recv().await {
            Ok(AppEvent::ExtractionStarted { call_type }) => {
                assert_eq!(call_type, "analyze_text");
            }
            _ => panic!("未收到预期事件"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(100);

        // 创建多个订阅者
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        // 发布事件
        bus.publish(AppEvent::ScoreUpdated {
            score: 95,
            status: CareStatus::Stable,
        });

        // 两个订阅者都应该收到事件
        assert!(receiver1.try_recv().is_ok());
        assert!(receiver2.try_recv().is_ok());
    }
}
