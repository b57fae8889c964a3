// API模块 - 面向外层展示壳的门面接口
//
// 所有函数接受 &AppState，错误统一折叠为String交给展示层提示。
// 展示壳（桌面/网页前端）只应依赖这一层，不直接触碰领域对象

pub mod config;
pub mod control;
pub mod extraction;
pub mod query;

pub use config::*;
pub use control::*;
pub use extraction::*;
pub use query::*;
