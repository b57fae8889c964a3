// 系统领域管理器
//
// 负责系统状态和日志基础设施

use crate::actors::SystemStatusHandle;
use crate::logger::LogBroadcaster;
use std::sync::Arc;

/// 系统领域管理器 - 负责系统状态和日志推送
#[derive(Clone)]
pub struct SystemDomain {
    status: SystemStatusHandle,
    log_broadcaster: Arc<LogBroadcaster>,
}

impl SystemDomain {
    /// 创建新的系统领域管理器
    pub fn new(status: SystemStatusHandle, log_broadcaster: Arc<LogBroadcaster>) -> Self {
        Self {
            status,
            log_broadcaster,
        }
    }

    /// 获取系统状态handle
    pub fn get_status(&self) -> &SystemStatusHandle {
        &self.status
    }

    /// 获取日志推送器
    pub fn get_log_broadcaster(&self) -> &Arc<LogBroadcaster> {
        &self.log_broadcaster
    }
}
