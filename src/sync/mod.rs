//! 同步原语模块
//!
//! 提供跨后端行为一致的同步原语:
//! - `AtomicCounter`: 无撕裂 32 位计数器
//! - `Mutex`: 互斥锁
//! - `ConditionVariable`: 条件变量
//! - `WaitGroup`: 计数完成同步
//! - `EventQueue`: 有界线程安全事件队列

pub mod atomic;
pub mod condvar;
pub mod eventqueue;
pub mod mutex;
pub mod waitgroup;

pub use atomic::AtomicCounter;
pub use condvar::ConditionVariable;
pub use eventqueue::EventQueue;
pub use mutex::Mutex;
pub use waitgroup::WaitGroup;
