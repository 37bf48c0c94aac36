//! 条件变量
//!
//! 不持有互斥锁引用: 每次等待由调用方显式传入一把 [`Mutex`]。
//! 等待原子地释放互斥锁、阻塞、被唤醒后重新加锁再返回。
//!
//! `signal` 只唤醒当前阻塞的等待者, 无人等待时不囤积唤醒;
//! `broadcast` 唤醒调用时刻的全部等待者, 之后才开始等待的
//! 调用者不受影响。

use portable_atomic::{AtomicBool, Ordering};

use crate::backend::RawCondvar;
use crate::sync::mutex::Mutex;

/// 可移植条件变量
///
/// # Example
/// ```
/// use syncport::{ConditionVariable, Mutex};
///
/// let m = Mutex::init();
/// let cv = ConditionVariable::init();
/// assert!(m.lock());
/// // 超时等待: 无人唤醒, 50ms 后返回 false, 互斥锁仍被持有
/// assert!(!cv.timed_wait(&m, 50));
/// assert!(m.unlock());
/// ```
pub struct ConditionVariable {
    initialized: AtomicBool,
    raw: RawCondvar,
}

impl ConditionVariable {
    /// 构造并初始化后端条件变量
    pub const fn init() -> Self {
        Self {
            initialized: AtomicBool::new(true),
            raw: RawCondvar::new(),
        }
    }

    /// 是否已初始化
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 无限等待
    ///
    /// 调用者必须持有 `mutex`; 返回时 `mutex` 已重新加锁。
    /// 任一对象未初始化或调用者未持锁返回 false。
    pub fn wait(&self, mutex: &Mutex) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match mutex.raw() {
            Some(raw) => self.raw.wait(raw),
            None => false,
        }
    }

    /// 限时等待; 超时未被唤醒返回 false (`mutex` 仍重新加锁)
    ///
    /// `timeout_ms == 0` 等价于 [`wait`](Self::wait)。
    pub fn timed_wait(&self, mutex: &Mutex, timeout_ms: u32) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match mutex.raw() {
            Some(raw) => self.raw.timed_wait(raw, timeout_ms),
            None => false,
        }
    }

    /// 唤醒至多一个当前等待者
    pub fn signal(&self) -> bool {
        self.is_initialized() && self.raw.signal()
    }

    /// 唤醒调用时刻的全部等待者
    pub fn broadcast(&self) -> bool {
        self.is_initialized() && self.raw.broadcast()
    }

    /// 失效; 先广播唤醒残留等待者, 不留下永久停泊的线程
    pub fn finalize(&self) {
        if self.is_initialized() {
            self.raw.broadcast();
            self.initialized.store(false, Ordering::Release);
        }
    }
}
