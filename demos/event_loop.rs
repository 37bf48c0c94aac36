//! 事件循环示例 - 生产者/消费者
//!
//! 模拟两类事件源向同一队列投递:
//! - "中断" 源: 用 try_push (有界工作量, 永不覆盖), 失败计入丢弃数
//! - 普通源: 用有损 push, 队满时自动淘汰最旧事件
//!
//! 控制循环 timed_pop 排空事件, 生产结束后协作关断。
//!
//! # 运行
//! ```bash
//! cargo run --example event_loop
//! ```

use std::thread;
use std::time::Duration;

use syncport::{AtomicCounter, EventQueue};

#[derive(Clone, Copy, Debug)]
enum Event {
    GpioEdge(u32),
    TimerTick(u32),
}

fn main() {
    let queue: EventQueue<Event> = EventQueue::init(8);
    let dropped = AtomicCounter::init(0);
    let handled = AtomicCounter::init(0);

    let queue = &queue;
    let dropped = &dropped;
    let handled = &handled;

    thread::scope(|s| {
        // "中断" 源: 非阻塞投递
        let isr = s.spawn(move || {
            for i in 0..50u32 {
                if !queue.try_push(Event::GpioEdge(i)) {
                    dropped.increment();
                }
                thread::sleep(Duration::from_millis(1));
            }
        });

        // 周期定时器: 有损投递, 永远接受最新事件
        let timer = s.spawn(move || {
            for i in 0..20u32 {
                queue.push(Event::TimerTick(i));
                thread::sleep(Duration::from_millis(3));
            }
        });

        // 控制循环
        let consumer = s.spawn(move || {
            while let Some(event) = queue.timed_pop(500) {
                match event {
                    Event::GpioEdge(n) => println!("gpio edge #{n}"),
                    Event::TimerTick(n) => println!("timer tick #{n}"),
                }
                handled.increment();
            }
        });

        isr.join().unwrap();
        timer.join().unwrap();
        queue.shutdown();
        consumer.join().unwrap();
    });

    println!(
        "done: handled {} events, {} dropped at the interrupt source",
        handled.get(),
        dropped.get()
    );
}
