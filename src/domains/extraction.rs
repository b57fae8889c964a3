// 提取领域管理器
//
// 负责LLM提取服务相关的功能，经由Actor handle访问ExtractionManager

use crate::actors::ExtractionHandle;

/// 提取领域管理器 - 持有与Extraction Actor通信的handle
#[derive(Clone)]
pub struct ExtractionDomain {
    handle: ExtractionHandle,
}

impl ExtractionDomain {
    /// 创建新的提取领域管理器
    pub fn new(handle: ExtractionHandle) -> Self {
        Self { handle }
    }

    /// 获取提取handle
    pub fn get_handle(&self) -> &ExtractionHandle {
        &self.handle
    }
}
