//! 事件队列
//!
//! 由一把互斥锁和一个条件变量守护的固定容量环形缓冲:
//! - `push`: 有损插入, 队满时覆盖最旧一项 ("永远接受, 保留最新 N 条")
//! - `try_push`: try_lock 路径, 工作量有界, 可在中断上下文调用, 永不覆盖
//! - `pop` / `timed_pop` / `try_pop`: 关断后继续排空缓冲, 排空后返回 None
//!
//! `head` 指向下一个写入槽, `tail` 指向最旧一项; 索引与计数只在
//! 持锁时修改。`peek` / `size` 的无锁读取是尽力而为的快照, 需要
//! 一致视图时通过 `lock` / `unlock` 在调用方组合检查与操作。

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;

use alloc::boxed::Box;
use alloc::vec::Vec;

use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::sync::condvar::ConditionVariable;
use crate::sync::mutex::Mutex;
use crate::util::time;
use crate::{log_debug, log_error};

/// 有界线程安全事件队列
///
/// `T` 是指针宽度级别的事件句柄, 要求 `Copy`。
///
/// # Example
/// ```
/// use syncport::EventQueue;
///
/// let q = EventQueue::init(3);
/// assert!(q.push(1u32));
/// assert!(q.push(2));
/// assert_eq!(q.pop(), Some(1));
/// q.shutdown();
/// assert_eq!(q.pop(), Some(2)); // 关断后仍可排空
/// assert_eq!(q.pop(), None);
/// ```
pub struct EventQueue<T: Copy> {
    initialized: AtomicBool,
    shutdown: AtomicBool,
    /// 下一个写入槽
    head: AtomicUsize,
    /// 最旧一项
    tail: AtomicUsize,
    count: AtomicUsize,
    capacity: usize,
    slots: UnsafeCell<Box<[MaybeUninit<T>]>>,
    mutex: Mutex,
    not_empty: ConditionVariable,
}

// Safety: 槽位仅在持有内部互斥锁时写入; T: Copy, 无析构别名问题。
// 唯一的无锁读取是 peek: 队满时的覆盖写可能与之并发, 读到的值
// 可能撕裂, 因此 peek 只承诺尽力而为的快照 (见其文档)。
unsafe impl<T: Copy + Send> Send for EventQueue<T> {}
unsafe impl<T: Copy + Send> Sync for EventQueue<T> {}

impl<T: Copy> EventQueue<T> {
    /// 创建容量为 `capacity` 的队列
    ///
    /// `capacity == 0` 或任一内部原语初始化失败得到不可用队列
    /// (所有操作失败), 不泄漏部分状态。
    pub fn init(capacity: usize) -> Self {
        let mutex = Mutex::init();
        let not_empty = ConditionVariable::init();
        let valid = capacity > 0 && mutex.is_initialized() && not_empty.is_initialized();
        if !valid {
            log_error!("event queue init rejected: capacity {}", capacity);
            mutex.finalize();
            not_empty.finalize();
        }
        let slots: Vec<MaybeUninit<T>> = if valid {
            (0..capacity).map(|_| MaybeUninit::uninit()).collect()
        } else {
            Vec::new()
        };
        Self {
            initialized: AtomicBool::new(valid),
            shutdown: AtomicBool::new(false),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            capacity: if valid { capacity } else { 0 },
            slots: UnsafeCell::new(slots.into_boxed_slice()),
            mutex,
            not_empty,
        }
    }

    /// 是否可用
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 是否已请求关断
    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// 容量
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前缓冲项数 (无锁快照)
    #[inline]
    pub fn size(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// 是否为空 (无锁快照)
    #[inline]
    pub fn empty(&self) -> bool {
        self.size() == 0
    }

    /// 持锁写入一项; 队满时覆盖最旧一项
    fn insert_locked(&self, item: T) {
        let slots = unsafe { &mut *self.slots.get() };
        let head = self.head.load(Ordering::Relaxed);
        slots[head].write(item);
        self.head.store((head + 1) % self.capacity, Ordering::Relaxed);
        let count = self.count.load(Ordering::Relaxed);
        if count == self.capacity {
            // 队满: head == tail, 刚写入的槽覆盖了最旧一项, tail 前移
            let tail = self.tail.load(Ordering::Relaxed);
            self.tail.store((tail + 1) % self.capacity, Ordering::Release);
        } else {
            self.count.store(count + 1, Ordering::Release);
        }
    }

    /// 持锁取出最旧一项; 调用者保证 count > 0
    fn take_locked(&self) -> T {
        let slots = unsafe { &*self.slots.get() };
        let tail = self.tail.load(Ordering::Relaxed);
        let item = unsafe { slots[tail].assume_init_read() };
        self.tail.store((tail + 1) % self.capacity, Ordering::Relaxed);
        self.count
            .store(self.count.load(Ordering::Relaxed) - 1, Ordering::Release);
        item
    }

    /// 有损插入: 队满时丢弃最旧一项并接受新项
    ///
    /// 只为获取内部锁而阻塞, 不等待容量。仅在未初始化或已关断时
    /// 失败。成功后广播唤醒等待者。
    pub fn push(&self, item: T) -> bool {
        if !self.is_initialized() || !self.mutex.lock() {
            return false;
        }
        if self.is_shut_down() {
            self.mutex.unlock();
            return false;
        }
        if self.count.load(Ordering::Relaxed) == self.capacity {
            log_debug!("event queue full, dropping oldest");
        }
        self.insert_locked(item);
        self.not_empty.broadcast();
        self.mutex.unlock();
        true
    }

    /// 非阻塞插入: 锁被占用、队满或已关断时失败, 永不覆盖
    pub fn try_push(&self, item: T) -> bool {
        if !self.is_initialized() || !self.mutex.try_lock() {
            return false;
        }
        if self.is_shut_down() || self.count.load(Ordering::Relaxed) == self.capacity {
            self.mutex.unlock();
            return false;
        }
        self.insert_locked(item);
        self.not_empty.broadcast();
        self.mutex.unlock();
        true
    }

    /// 阻塞取出最旧一项
    ///
    /// 队空时等待; 关断且排空后返回 None (对所有当前与未来的
    /// 调用者立即返回, 不再阻塞)。
    pub fn pop(&self) -> Option<T> {
        if !self.is_initialized() || !self.mutex.lock() {
            return None;
        }
        while self.count.load(Ordering::Relaxed) == 0 && !self.is_shut_down() {
            if !self.not_empty.wait(&self.mutex) {
                self.mutex.unlock();
                return None;
            }
        }
        let item = if self.count.load(Ordering::Relaxed) > 0 {
            Some(self.take_locked())
        } else {
            None
        };
        self.mutex.unlock();
        item
    }

    /// 非阻塞取出; 队空返回 None, 与关断状态无关
    pub fn try_pop(&self) -> Option<T> {
        if !self.is_initialized() || !self.mutex.lock() {
            return None;
        }
        let item = if self.count.load(Ordering::Relaxed) > 0 {
            Some(self.take_locked())
        } else {
            None
        };
        self.mutex.unlock();
        item
    }

    /// 限时取出; 超时且无数据返回 None
    ///
    /// `timeout_ms == 0` 等价于 [`pop`](Self::pop)。超时返回 None
    /// 与关断返回 None 在类型上无法区分, 需要区分时调用方检查
    /// [`is_shut_down`](Self::is_shut_down)。
    pub fn timed_pop(&self, timeout_ms: u32) -> Option<T> {
        if timeout_ms == 0 {
            return self.pop();
        }
        if !self.is_initialized() || !self.mutex.lock() {
            return None;
        }
        let start = time::now_ms();
        loop {
            if self.count.load(Ordering::Relaxed) > 0 {
                let item = self.take_locked();
                self.mutex.unlock();
                return Some(item);
            }
            if self.is_shut_down() {
                break;
            }
            let elapsed = time::elapsed_ms(start);
            if elapsed >= timeout_ms {
                break;
            }
            // 剩余预算 > 0, 不会退化为无限等待
            self.not_empty.timed_wait(&self.mutex, timeout_ms - elapsed);
        }
        self.mutex.unlock();
        None
    }

    /// 无锁窥视最旧一项, 不移除
    ///
    /// 尽力而为的快照; 队满时的覆盖写与本读取并发可能得到撕裂的
    /// 值。需要一致视图时用 [`lock`](Self::lock) /
    /// [`unlock`](Self::unlock) 组合调用方侧的检查与操作。
    pub fn peek(&self) -> Option<T> {
        if !self.is_initialized() || self.count.load(Ordering::Acquire) == 0 {
            return None;
        }
        let slots = unsafe { &*self.slots.get() };
        let tail = self.tail.load(Ordering::Acquire);
        Some(unsafe { slots[tail].assume_init_read() })
    }

    /// 请求关断: 不再接受新事件, 唤醒全部等待者
    ///
    /// 幂等; 不清空缓冲, 已入队事件仍可通过 pop 族排空。
    pub fn shutdown(&self) {
        if !self.is_initialized() || !self.mutex.lock() {
            return;
        }
        if !self.is_shut_down() {
            self.shutdown.store(true, Ordering::Release);
            log_debug!("event queue shutdown requested");
        }
        self.not_empty.broadcast();
        self.mutex.unlock();
    }

    /// 清空缓冲 (持锁); 不改变关断状态
    pub fn clear(&self) {
        if !self.is_initialized() || !self.mutex.lock() {
            return;
        }
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Release);
        self.mutex.unlock();
    }

    /// 获取内部锁, 供调用方执行复合检查-操作
    pub fn lock(&self) -> bool {
        self.is_initialized() && self.mutex.lock()
    }

    /// 释放内部锁
    pub fn unlock(&self) -> bool {
        self.is_initialized() && self.mutex.unlock()
    }

    /// 关断、清空并失效
    pub fn finalize(&self) {
        if !self.is_initialized() {
            return;
        }
        self.shutdown();
        if self.mutex.lock() {
            self.head.store(0, Ordering::Relaxed);
            self.tail.store(0, Ordering::Relaxed);
            self.count.store(0, Ordering::Relaxed);
            self.initialized.store(false, Ordering::Release);
            self.mutex.unlock();
        }
        self.not_empty.finalize();
        self.mutex.finalize();
    }
}
