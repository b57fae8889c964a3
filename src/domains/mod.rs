// 领域模块 - 用于组织应用的业务逻辑
//
// 将应用状态按业务领域分组,实现单一职责原则
// 包含3个领域:提取、存储、系统

pub mod extraction;
pub mod storage;
pub mod system;

pub use extraction::ExtractionDomain;
pub use storage::StorageDomain;
pub use system::SystemDomain;
