//! 裸机双核后端
//!
//! 双核微控制器模型: 没有抢占式调度器, "阻塞" 即自旋等待,
//! 自旋可被硬件中断打断。
//! - `RawMutex`: TTAS 自旋锁, 硬件互斥锁的可移植对应物
//! - `Semaphore`: 计数信号量, 限时获取基于 `util::time` 毫秒滴答
//! - `RawCondvar`: 信号量 + 由内部自旋锁保护的等待者计数
//!
//! 自旋锁无法识别持有者 (裸机上没有线程标识), 因此不提供
//! 重入检测; 同核重入加锁会死锁自旋, 这与硬件互斥锁行为一致。
//! 解锁未加锁的互斥锁仍会被检出并报告失败。
//!
//! 本模块只依赖 portable-atomic, 与目标无关; 测试构建中
//! 在宿主线程上同样成立。

use core::hint::spin_loop;

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::util::time;

// ===================================================================
// 自旋互斥锁
// ===================================================================

/// TTAS 自旋互斥锁
pub struct RawMutex {
    locked: AtomicBool,
}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// 自旋直到获得锁
    pub fn lock(&self) -> bool {
        loop {
            if self.try_lock() {
                return true;
            }
            // 测试-测试-置位: 只读自旋, 减少核间总线争用
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// 非阻塞加锁
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// 解锁; 对未加锁的互斥锁解锁返回 false
    pub fn unlock(&self) -> bool {
        self.locked.swap(false, Ordering::Release)
    }
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// 计数信号量
// ===================================================================

/// 计数信号量
pub struct Semaphore {
    permits: AtomicU32,
}

impl Semaphore {
    pub const fn new(initial: u32) -> Self {
        Self {
            permits: AtomicU32::new(initial),
        }
    }

    /// 非阻塞获取一个配额
    pub fn try_acquire(&self) -> bool {
        self.permits
            .fetch_update(Ordering::Acquire, Ordering::Relaxed, |p| p.checked_sub(1))
            .is_ok()
    }

    /// 自旋直到获得一个配额
    pub fn acquire(&self) {
        while !self.try_acquire() {
            spin_loop();
        }
    }

    /// 限时获取; 超时返回 false。`timeout_ms == 0` 表示无限等待。
    pub fn acquire_timeout(&self, timeout_ms: u32) -> bool {
        if timeout_ms == 0 {
            self.acquire();
            return true;
        }
        let start = time::now_ms();
        loop {
            if self.try_acquire() {
                return true;
            }
            if time::elapsed_ms(start) >= timeout_ms {
                return false;
            }
            spin_loop();
        }
    }

    /// 归还 n 个配额
    pub fn release(&self, n: u32) {
        self.permits.fetch_add(n, Ordering::Release);
    }

    /// 当前可用配额
    pub fn available(&self) -> u32 {
        self.permits.load(Ordering::Relaxed)
    }
}

// ===================================================================
// 信号量构建的条件变量
// ===================================================================

/// 原始条件变量
///
/// `waiters` 只在 `guard` 锁内修改。`signal` 在有等待者注册时
/// 消掉一个注册并发放一个唤醒配额, 因此无人等待时的 signal
/// 不会被未来的等待者消费; `broadcast` 在持有 `guard` 的情况下
/// 快照并一次性发放全部配额, 注册晚于快照的等待者无法在
/// 快照与发放之间插队。
pub struct RawCondvar {
    guard: RawMutex,
    waiters: AtomicU32,
    wake: Semaphore,
}

impl RawCondvar {
    pub const fn new() -> Self {
        Self {
            guard: RawMutex::new(),
            waiters: AtomicU32::new(0),
            wake: Semaphore::new(0),
        }
    }

    fn register(&self) {
        self.guard.lock();
        self.waiters.fetch_add(1, Ordering::Relaxed);
        self.guard.unlock();
    }

    fn deregister(&self) {
        self.guard.lock();
        if self.waiters.load(Ordering::Relaxed) > 0 {
            self.waiters.fetch_sub(1, Ordering::Relaxed);
        }
        self.guard.unlock();
    }

    /// 无限等待。调用者必须持有 `mutex`; 返回时已重新加锁。
    pub fn wait(&self, mutex: &RawMutex) -> bool {
        self.register();
        if !mutex.unlock() {
            self.deregister();
            return false;
        }
        self.wake.acquire();
        mutex.lock()
    }

    /// 限时等待; 超时返回 false (mutex 仍重新加锁)。
    /// `timeout_ms == 0` 等价于 [`wait`](Self::wait)。
    pub fn timed_wait(&self, mutex: &RawMutex, timeout_ms: u32) -> bool {
        if timeout_ms == 0 {
            return self.wait(mutex);
        }
        self.register();
        if !mutex.unlock() {
            self.deregister();
            return false;
        }
        let mut woken = self.wake.acquire_timeout(timeout_ms);
        if !woken {
            self.guard.lock();
            if self.waiters.load(Ordering::Relaxed) > 0 {
                self.waiters.fetch_sub(1, Ordering::Relaxed);
                self.guard.unlock();
            } else {
                // 注册已被 signal/broadcast 消费, 配额已在途: 补收之
                self.guard.unlock();
                self.wake.acquire();
                woken = true;
            }
        }
        mutex.lock() && woken
    }

    /// 唤醒至多一个当前等待者; 无人等待时不囤积配额
    pub fn signal(&self) -> bool {
        self.guard.lock();
        if self.waiters.load(Ordering::Relaxed) > 0 {
            self.waiters.fetch_sub(1, Ordering::Relaxed);
            self.wake.release(1);
        }
        self.guard.unlock();
        true
    }

    /// 唤醒调用时刻的全部等待者
    pub fn broadcast(&self) -> bool {
        self.guard.lock();
        let n = self.waiters.swap(0, Ordering::Relaxed);
        if n > 0 {
            self.wake.release(n);
        }
        self.guard.unlock();
        true
    }
}

impl Default for RawCondvar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_spin_lock_basic() {
        let m = RawMutex::new();
        assert!(m.try_lock());
        assert!(!m.try_lock());
        assert!(m.unlock());
        assert!(!m.unlock());
    }

    #[test]
    fn test_spin_lock_exclusion() {
        let m = RawMutex::new();
        let total = AtomicU64::new(0);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        assert!(m.lock());
                        let v = total.load(Ordering::Relaxed);
                        total.store(v + 1, Ordering::Relaxed);
                        assert!(m.unlock());
                    }
                });
            }
        });
        assert_eq!(total.load(Ordering::Relaxed), 4_000);
    }

    #[test]
    fn test_semaphore_counting() {
        let sem = Semaphore::new(2);
        assert!(sem.try_acquire());
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
        sem.release(1);
        assert!(sem.try_acquire());
        assert_eq!(sem.available(), 0);
    }

    #[test]
    fn test_semaphore_timeout() {
        let sem = Semaphore::new(0);
        let start = std::time::Instant::now();
        assert!(!sem.acquire_timeout(30));
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_semaphore_cross_thread() {
        let sem = Semaphore::new(0);
        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(30));
                sem.release(1);
            });
            assert!(sem.acquire_timeout(2_000));
        });
    }

    #[test]
    fn test_condvar_signal() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        let flag = AtomicBool::new(false);
        thread::scope(|s| {
            s.spawn(|| {
                assert!(m.lock());
                while !flag.load(Ordering::Relaxed) {
                    assert!(cv.wait(&m));
                }
                assert!(m.unlock());
            });
            thread::sleep(Duration::from_millis(30));
            assert!(m.lock());
            flag.store(true, Ordering::Relaxed);
            assert!(cv.signal());
            assert!(m.unlock());
        });
    }

    #[test]
    fn test_condvar_broadcast() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        let ready = AtomicBool::new(false);
        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    assert!(m.lock());
                    while !ready.load(Ordering::Relaxed) {
                        assert!(cv.wait(&m));
                    }
                    assert!(m.unlock());
                });
            }
            thread::sleep(Duration::from_millis(30));
            assert!(m.lock());
            ready.store(true, Ordering::Relaxed);
            assert!(cv.broadcast());
            assert!(m.unlock());
        });
    }

    #[test]
    fn test_condvar_signal_without_waiter_not_banked() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        assert!(cv.signal());
        assert!(m.lock());
        assert!(!cv.timed_wait(&m, 30));
        assert!(m.unlock());
    }

    #[test]
    fn test_condvar_timed_wait_timeout() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        assert!(m.lock());
        assert!(!cv.timed_wait(&m, 30));
        // 超时返回后互斥锁必须处于加锁状态
        assert!(m.unlock());
    }
}
