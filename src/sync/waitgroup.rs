//! 等待组
//!
//! 跟踪申报的未完成工作量, 让一方阻塞到全部完成。
//!
//! 计数语义: `add` 接受任意符号的增量, 但结果为负时回退并拒绝;
//! `done` 即 `add(-1)`, 因此多余的 `done` 同样被拒绝且不破坏计数。
//! `finalize` 阻塞到计数归零后将对象失效: 它同时是 "等待" 与
//! "销毁", 没有单独的非破坏性等待。

use portable_atomic::{AtomicBool, AtomicI32, Ordering};

use crate::backend::{RawCondvar, RawMutex};
use crate::log_warn;

/// 计数完成同步
///
/// # Example
/// ```
/// use syncport::WaitGroup;
///
/// let wg = WaitGroup::init();
/// assert!(wg.add(2));
/// assert!(wg.done());
/// assert!(wg.done());
/// wg.finalize(); // 计数已归零, 立即返回
/// assert!(!wg.is_initialized());
/// ```
pub struct WaitGroup {
    initialized: AtomicBool,
    /// 仅在 lock 内修改
    count: AtomicI32,
    lock: RawMutex,
    quiescent: RawCondvar,
}

impl WaitGroup {
    /// 创建等待组, 未完成计数为 0
    pub const fn init() -> Self {
        Self {
            initialized: AtomicBool::new(true),
            count: AtomicI32::new(0),
            lock: RawMutex::new(),
            quiescent: RawCondvar::new(),
        }
    }

    /// 是否已初始化
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 当前未完成计数
    #[inline]
    pub fn count(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }

    /// 调整预期完成数; 结果为负时拒绝并保持原值
    pub fn add(&self, delta: i32) -> bool {
        if !self.is_initialized() || !self.lock.lock() {
            return false;
        }
        let current = self.count.load(Ordering::Relaxed);
        let ok = match current.checked_add(delta) {
            Some(next) if next >= 0 => {
                self.count.store(next, Ordering::Relaxed);
                if next == 0 {
                    self.quiescent.broadcast();
                }
                true
            }
            _ => false,
        };
        self.lock.unlock();
        ok
    }

    /// 标记一个工作单元完成; 计数归零时唤醒阻塞的 finalize 调用者
    pub fn done(&self) -> bool {
        let ok = self.add(-1);
        if !ok && self.is_initialized() {
            log_warn!("waitgroup done() without matching add()");
        }
        ok
    }

    /// 阻塞到未完成计数归零, 然后失效
    pub fn finalize(&self) {
        if !self.is_initialized() || !self.lock.lock() {
            return;
        }
        while self.count.load(Ordering::Relaxed) > 0 {
            if !self.quiescent.wait(&self.lock) {
                break;
            }
        }
        self.initialized.store(false, Ordering::Release);
        self.lock.unlock();
    }
}
