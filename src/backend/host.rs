//! 宿主后端 - OS 线程模型
//!
//! 基于 `std::sync` 原语构建原始互斥锁与条件变量:
//! - `RawMutex`: 错误检查型互斥锁, 拒绝持有者重入加锁与非持有者解锁
//! - `RawCondvar`: 带等待者/唤醒配额账目的条件变量
//!
//! 账目规则: `signal` 只在当前存在阻塞等待者时发放一个唤醒配额,
//! `broadcast` 提升世代号使调用时刻的全部等待者返回;
//! 之后才开始等待的调用者不会消费本次广播。
//!
//! std 互斥锁毒化通过 `into_inner` 恢复: 本层只存账目数据,
//! 持锁线程 panic 不会破坏一致性, 因此没有 panic 路径。

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

fn unpoison<'a, T>(
    r: Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    match r {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ===================================================================
// 原始互斥锁
// ===================================================================

struct MutexState {
    locked: bool,
    owner: Option<ThreadId>,
}

/// 错误检查型原始互斥锁 (pthread ERRORCHECK 的 std 对应物)
pub struct RawMutex {
    state: Mutex<MutexState>,
    released: Condvar,
}

impl RawMutex {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(MutexState {
                locked: false,
                owner: None,
            }),
            released: Condvar::new(),
        }
    }

    /// 阻塞加锁; 持有者重入返回 false
    pub fn lock(&self) -> bool {
        let me = thread::current().id();
        let mut st = unpoison(self.state.lock());
        if st.locked && st.owner == Some(me) {
            return false;
        }
        while st.locked {
            st = unpoison(self.released.wait(st));
        }
        st.locked = true;
        st.owner = Some(me);
        true
    }

    /// 非阻塞加锁
    pub fn try_lock(&self) -> bool {
        let mut st = unpoison(self.state.lock());
        if st.locked {
            return false;
        }
        st.locked = true;
        st.owner = Some(thread::current().id());
        true
    }

    /// 解锁; 未加锁或非持有者解锁返回 false
    pub fn unlock(&self) -> bool {
        let me = thread::current().id();
        let mut st = unpoison(self.state.lock());
        if !st.locked || st.owner != Some(me) {
            return false;
        }
        st.locked = false;
        st.owner = None;
        drop(st);
        self.released.notify_one();
        true
    }
}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// 原始条件变量
// ===================================================================

struct CondState {
    /// 当前已注册的等待者
    waiters: u32,
    /// signal 发放、尚未被消费的唤醒配额
    signals: u32,
    /// broadcast 世代号
    generation: u64,
}

/// 原始条件变量
pub struct RawCondvar {
    state: Mutex<CondState>,
    wake: Condvar,
}

impl RawCondvar {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(CondState {
                waiters: 0,
                signals: 0,
                generation: 0,
            }),
            wake: Condvar::new(),
        }
    }

    /// 无限等待。调用者必须持有 `mutex`; 返回时已重新加锁。
    pub fn wait(&self, mutex: &RawMutex) -> bool {
        let mut st = unpoison(self.state.lock());
        st.waiters += 1;
        let my_generation = st.generation;
        if !mutex.unlock() {
            st.waiters -= 1;
            return false;
        }
        loop {
            if st.generation != my_generation {
                break;
            }
            if st.signals > 0 {
                st.signals -= 1;
                break;
            }
            st = unpoison(self.wake.wait(st));
        }
        st.waiters -= 1;
        drop(st);
        mutex.lock()
    }

    /// 限时等待; 超时未被唤醒返回 false (mutex 仍重新加锁)。
    /// `timeout_ms == 0` 等价于 [`wait`](Self::wait)。
    pub fn timed_wait(&self, mutex: &RawMutex, timeout_ms: u32) -> bool {
        if timeout_ms == 0 {
            return self.wait(mutex);
        }
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        let mut st = unpoison(self.state.lock());
        st.waiters += 1;
        let my_generation = st.generation;
        if !mutex.unlock() {
            st.waiters -= 1;
            return false;
        }
        let mut woken = false;
        loop {
            if st.generation != my_generation {
                woken = true;
                break;
            }
            if st.signals > 0 {
                st.signals -= 1;
                woken = true;
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            st = match self.wake.wait_timeout(st, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        st.waiters -= 1;
        drop(st);
        mutex.lock() && woken
    }

    /// 唤醒至多一个当前等待者; 无人等待时不囤积配额
    pub fn signal(&self) -> bool {
        let mut st = unpoison(self.state.lock());
        if st.signals < st.waiters {
            st.signals += 1;
            drop(st);
            self.wake.notify_one();
        }
        true
    }

    /// 唤醒调用时刻的全部等待者
    pub fn broadcast(&self) -> bool {
        let mut st = unpoison(self.state.lock());
        if st.waiters > 0 {
            st.generation += 1;
            // 在途的 signal 配额被广播吸收, 不留给未来的等待者
            st.signals = 0;
            drop(st);
            self.wake.notify_all();
        }
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
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    #[test]
    fn test_lock_unlock() {
        let m = RawMutex::new();
        assert!(m.lock());
        assert!(m.unlock());
    }

    #[test]
    fn test_relock_same_thread_rejected() {
        let m = RawMutex::new();
        assert!(m.lock());
        assert!(!m.lock());
        assert!(m.unlock());
    }

    #[test]
    fn test_unlock_without_lock_rejected() {
        let m = RawMutex::new();
        assert!(!m.unlock());
    }

    #[test]
    fn test_unlock_from_other_thread_rejected() {
        let m = RawMutex::new();
        assert!(m.lock());
        thread::scope(|s| {
            s.spawn(|| {
                assert!(!m.unlock());
            });
        });
        assert!(m.unlock());
    }

    #[test]
    fn test_try_lock_contended() {
        let m = RawMutex::new();
        assert!(m.try_lock());
        thread::scope(|s| {
            s.spawn(|| {
                assert!(!m.try_lock());
            });
        });
        assert!(m.unlock());
    }

    #[test]
    fn test_signal_not_banked_for_future_waiter() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        // 无人等待时的 signal 不得被之后的等待者消费
        assert!(cv.signal());
        assert!(m.lock());
        assert!(!cv.timed_wait(&m, 50));
        assert!(m.unlock());
    }

    #[test]
    fn test_signal_wakes_waiter() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        let flag = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel();
        thread::scope(|s| {
            s.spawn(|| {
                assert!(m.lock());
                while !flag.load(Ordering::Relaxed) {
                    assert!(cv.wait(&m));
                }
                assert!(m.unlock());
                tx.send(()).unwrap();
            });
            thread::sleep(Duration::from_millis(50));
            assert!(m.lock());
            flag.store(true, Ordering::Relaxed);
            assert!(cv.signal());
            assert!(m.unlock());
            rx.recv_timeout(Duration::from_secs(2)).unwrap();
        });
    }

    #[test]
    fn test_broadcast_wakes_all_current_waiters() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        let ready = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel();
        let (m, cv, ready) = (&m, &cv, &ready);
        thread::scope(|s| {
            for _ in 0..4 {
                let tx = tx.clone();
                s.spawn(move || {
                    assert!(m.lock());
                    while !ready.load(Ordering::Relaxed) {
                        assert!(cv.wait(&m));
                    }
                    assert!(m.unlock());
                    tx.send(()).unwrap();
                });
            }
            thread::sleep(Duration::from_millis(50));
            assert!(m.lock());
            ready.store(true, Ordering::Relaxed);
            assert!(cv.broadcast());
            assert!(m.unlock());
            for _ in 0..4 {
                rx.recv_timeout(Duration::from_secs(2)).unwrap();
            }
        });
    }

    #[test]
    fn test_timed_wait_deadline() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        assert!(m.lock());
        let start = Instant::now();
        assert!(!cv.timed_wait(&m, 40));
        assert!(start.elapsed() >= Duration::from_millis(35));
        // 超时返回后互斥锁必须处于加锁状态
        assert!(m.unlock());
    }

    #[test]
    fn test_wait_requires_held_mutex() {
        let m = RawMutex::new();
        let cv = RawCondvar::new();
        assert!(!cv.wait(&m));
        assert!(!cv.timed_wait(&m, 10));
    }
}
