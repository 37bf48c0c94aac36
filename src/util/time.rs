//! 毫秒时间基准
//!
//! 为 `timed_wait` / `timed_pop` 提供统一的毫秒时钟:
//! - `std`: 进程启动后的单调时钟 (Instant)
//! - 裸机: 由平台定时器中断通过 [`advance_ms`] 推进的回绕计数器
//!
//! 计数器约 49.7 天回绕一次, 所有耗时运算使用 `wrapping_sub`,
//! 因此跨回绕的超时判断仍然正确。

#[cfg(feature = "std")]
mod imp {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();

    /// 当前毫秒时间戳 (回绕)
    pub fn now_ms() -> u32 {
        EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u32
    }
}

#[cfg(not(feature = "std"))]
mod imp {
    use portable_atomic::{AtomicU32, Ordering};

    static TICK_MS: AtomicU32 = AtomicU32::new(0);

    /// 当前毫秒时间戳 (回绕)
    pub fn now_ms() -> u32 {
        TICK_MS.load(Ordering::Relaxed)
    }

    /// 推进毫秒计数, 由平台定时器中断调用
    pub fn advance_ms(ms: u32) {
        TICK_MS.fetch_add(ms, Ordering::Relaxed);
    }
}

#[cfg(not(feature = "std"))]
pub use imp::advance_ms;
pub use imp::now_ms;

/// 自 `start_ms` 起经过的毫秒数 (回绕安全)
#[inline]
pub fn elapsed_ms(start_ms: u32) -> u32 {
    now_ms().wrapping_sub(start_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_monotonic() {
        let a = now_ms();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let b = now_ms();
        assert!(b.wrapping_sub(a) >= 9);
    }

    #[test]
    fn test_elapsed_ms() {
        let start = now_ms();
        std::thread::sleep(std::time::Duration::from_millis(15));
        assert!(elapsed_ms(start) >= 14);
    }
}
