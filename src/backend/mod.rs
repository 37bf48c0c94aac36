//! 平台后端
//!
//! 与日志系统一样按 feature 选择实现:
//! - `std`: 宿主后端, 基于 OS 线程与 `std::sync` 原语
//! - 其余: 裸机双核后端, 基于自旋锁与计数信号量
//!
//! 两个后端向上层暴露同名的 `RawMutex` / `RawCondvar`,
//! 语义完全一致; 可移植层不感知自己跑在哪个后端上。
//! 裸机实现与目标无关, 因此在测试构建中同时编译,
//! 以便在宿主上验证自旋路径。

#[cfg(feature = "std")]
pub mod host;

#[cfg(any(not(feature = "std"), test))]
pub mod mcu;

#[cfg(feature = "std")]
pub use host::{RawCondvar, RawMutex};

#[cfg(not(feature = "std"))]
pub use mcu::{RawCondvar, RawMutex};
