//! 互斥锁
//!
//! 值语义: `init()` 构造, `finalize()` 失效。对未初始化对象的
//! 一切操作返回 false, 没有 panic 路径, 由调用方检查布尔值。
//!
//! 后端解锁失败 (未持有 / 非持有者解锁) 记录日志并向调用方
//! 传播为 false。

use portable_atomic::{AtomicBool, Ordering};

use crate::backend::RawMutex;
use crate::log_warn;

/// 可移植互斥锁
///
/// # Example
/// ```
/// use syncport::Mutex;
///
/// let m = Mutex::init();
/// assert!(m.lock());
/// assert!(m.unlock());
/// m.finalize();
/// assert!(!m.lock());
/// ```
pub struct Mutex {
    initialized: AtomicBool,
    raw: RawMutex,
}

impl Mutex {
    /// 构造并初始化后端锁
    pub const fn init() -> Self {
        Self {
            initialized: AtomicBool::new(true),
            raw: RawMutex::new(),
        }
    }

    /// 是否已初始化
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 阻塞直到获得锁; 未初始化或后端失败返回 false
    pub fn lock(&self) -> bool {
        self.is_initialized() && self.raw.lock()
    }

    /// 非阻塞加锁; 已被持有或未初始化返回 false
    pub fn try_lock(&self) -> bool {
        self.is_initialized() && self.raw.try_lock()
    }

    /// 解锁; 后端解锁失败记录日志并返回 false
    pub fn unlock(&self) -> bool {
        if !self.is_initialized() {
            return false;
        }
        let ok = self.raw.unlock();
        if !ok {
            log_warn!("mutex unlock failed: not held by caller");
        }
        ok
    }

    /// 失效; 幂等, 此后所有操作返回 false
    pub fn finalize(&self) {
        self.initialized.store(false, Ordering::Release);
    }

    pub(crate) fn raw(&self) -> Option<&RawMutex> {
        if self.is_initialized() {
            Some(&self.raw)
        } else {
            None
        }
    }
}
