//! 工具模块
//!
//! - `log`: 条件编译日志系统
//! - `time`: 毫秒时间基准

pub mod log;
pub mod time;
