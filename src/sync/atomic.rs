//! 原子计数器
//!
//! 单个 32 位值的无撕裂读写与增减。只保证原子性 (Relaxed 序),
//! 不提供 acquire/release 栅栏: 不能靠它向其他线程发布非原子
//! 数据, 需要发布语义时由调用方自加屏障。

use portable_atomic::{AtomicU32, Ordering};

/// 32 位原子计数器
///
/// # Example
/// ```
/// use syncport::AtomicCounter;
///
/// let c = AtomicCounter::init(10);
/// assert_eq!(c.increment(), 11);
/// assert_eq!(c.decrement(), 10);
/// assert_eq!(c.get(), 10);
/// ```
pub struct AtomicCounter {
    value: AtomicU32,
}

impl AtomicCounter {
    /// 创建指定初始值的计数器
    pub const fn init(initial: u32) -> Self {
        Self {
            value: AtomicU32::new(initial),
        }
    }

    /// 读取当前值
    #[inline(always)]
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }

    /// 写入新值
    #[inline(always)]
    pub fn set(&self, value: u32) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// 加一并返回新值
    #[inline(always)]
    pub fn increment(&self) -> u32 {
        self.value.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// 减一并返回新值
    #[inline(always)]
    pub fn decrement(&self) -> u32 {
        self.value.fetch_sub(1, Ordering::Relaxed).wrapping_sub(1)
    }

    /// 加指定值并返回新值
    #[inline(always)]
    pub fn add(&self, delta: u32) -> u32 {
        self.value.fetch_add(delta, Ordering::Relaxed).wrapping_add(delta)
    }

    /// 重置为 0
    #[inline(always)]
    pub fn reset(&self) {
        self.set(0);
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::init(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_basic_operations() {
        let c = AtomicCounter::init(5);
        assert_eq!(c.get(), 5);
        c.set(7);
        assert_eq!(c.get(), 7);
        assert_eq!(c.increment(), 8);
        assert_eq!(c.decrement(), 7);
        assert_eq!(c.add(3), 10);
        c.reset();
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn test_wrapping() {
        let c = AtomicCounter::init(u32::MAX);
        assert_eq!(c.increment(), 0);
        assert_eq!(c.decrement(), u32::MAX);
    }

    #[test]
    fn test_concurrent_increments() {
        let c = AtomicCounter::init(0);
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        c.increment();
                    }
                });
            }
        });
        assert_eq!(c.get(), 4_000);
    }
}
