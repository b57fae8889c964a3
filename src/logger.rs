// 自定义日志层 - 支持将日志实时推送给外层展示壳

use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// 日志消息
#[derive(Clone, Debug, serde::Serialize)]
pub struct LogMessage {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

/// 日志推送器 - 通过broadcast通道把日志分发给订阅方（前端壳、诊断面板等）
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogMessage>,
    enabled: Arc<RwLock<bool>>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(512);
        Self {
            sender,
            enabled: Arc::new(RwLock::new(true)),
        }
    }

    /// 订阅日志流
    pub fn subscribe(&self) -> broadcast::Receiver<LogMessage> {
        self.sender.subscribe()
    }

    /// 设置日志推送开关
    pub fn set_enabled(&self, enabled: bool) {
        if let Ok(mut e) = self.enabled.write() {
            *e = enabled;
        }
    }

    /// 获取日志推送状态
    pub fn is_enabled(&self) -> bool {
        self.enabled.read().map(|e| *e).unwrap_or(false)
    }

    /// 推送日志
    fn emit_log(&self, log: LogMessage) {
        if !self.is_enabled() {
            return;
        }

        // 无订阅者时send会失败，属于正常情况
        let _ = self.sender.send(log);
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// 自定义日志层
pub struct BroadcastLogLayer {
    broadcaster: Arc<LogBroadcaster>,
}

impl BroadcastLogLayer {
    pub fn new(broadcaster: Arc<LogBroadcaster>) -> Self {
        Self { broadcaster }
    }
}

impl<S: Subscriber> Layer<S> for BroadcastLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // 提取日志级别
        let metadata = event.metadata();
        let level = metadata.level().to_string();
        let target = metadata.target().to_string();

        // 使用 visitor 提取消息
        struct MessageVisitor {
            message: String,
        }

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{:?}", value);
                    // 移除首尾引号
                    if self.message.starts_with('"') && self.message.ends_with('"') {
                        self.message = self.message[1..self.message.len() - 1].to_string();
                    }
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        // 生成时间戳
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();

        let log = LogMessage {
            timestamp,
            level,
            target,
            message: visitor.message,
        };

        self.broadcaster.emit_log(log);
    }
}

/// 初始化日志系统（带推送功能）
pub fn init_with_broadcaster(
    broadcaster: Arc<LogBroadcaster>,
) -> Result<(), SetGlobalDefaultError> {
    use tracing_subscriber::fmt::time::LocalTime;
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let log_dir = crate::utils::file_system::get_log_dir();

    // 创建日志目录
    std::fs::create_dir_all(&log_dir).ok();

    // 配置日志输出到文件（每天轮转）
    let file_appender = tracing_appender::rolling::daily(log_dir.clone(), "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // 保持 guard 在整个程序生命周期
    std::mem::forget(_guard);

    // 同时输出到控制台和文件
    let writer = std::io::stdout.and(non_blocking);

    // 使用本地时区
    let timer = LocalTime::new(
        time::format_description::parse(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]",
        )
        .expect("内置时间格式必须可解析"),
    );

    // 创建自定义日志层
    let broadcast_layer = BroadcastLogLayer::new(broadcaster);

    // 组合所有层
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(cfg!(debug_assertions)) // release 版本不使用颜色代码
        .finish()
        .with(broadcast_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    eprintln!("日志文件位置: {:?}", log_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcaster_enabled_flag() {
        let broadcaster = LogBroadcaster::new();
        assert!(broadcaster.is_enabled());

        broadcaster.set_enabled(false);
        assert!(!broadcaster.is_enabled());
    }

    #[test]
    fn test_broadcaster_delivers_to_subscriber() {
        let broadcaster = LogBroadcaster::new();
        let mut receiver = broadcaster.subscribe();

        broadcaster.emit_log(LogMessage {
            timestamp: "2026-08-07 10:00:00.000".to_string(),
            level: "INFO".to_string(),
            target: "care_octopus::test".to_string(),
            message: "hello".to_string(),
        });

        let msg = receiver.try_recv().unwrap();
        assert_eq!(msg.message, "hello");
    }
}
