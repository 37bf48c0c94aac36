//! SyncPort - 可移植同步原语库
//!
//! 本库提供以下核心功能:
//! - 互斥锁 / 条件变量 / 等待组 / 原子计数器
//! - 有界线程安全事件队列 (有损 push, 协作式关断)
//! - 可互换后端: OS 线程 (`std`) 与裸机双核自旋 (默认关闭 `std`)
//!
//! 两个后端对外行为完全一致: 阻塞、超时、关断、队满覆盖
//! 在任一后端上可观测结果相同。执行上下文 (线程/核心的创建)
//! 由外部提供, 本库只假设 "某个函数可以与调用者并发运行"。

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backend;
pub mod sync;
pub mod util;

// ===== 重导出常用类型 =====
pub use sync::atomic::AtomicCounter;
pub use sync::condvar::ConditionVariable;
pub use sync::eventqueue::EventQueue;
pub use sync::mutex::Mutex;
pub use sync::waitgroup::WaitGroup;

// ===== 版本信息 =====
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 系统配置常量
pub mod config {
    /// 超时参数哨兵值: 0 表示无限等待
    pub const WAIT_FOREVER: u32 = 0;

    /// 事件队列默认容量
    pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

    /// 裸机后端毫秒滴答频率 (Hz), 对应 `util::time::advance_ms(1)`
    pub const TICK_FREQ_HZ: u32 = 1_000;
}
