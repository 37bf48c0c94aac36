//! 等待组示例 - 扇出工作与完成汇合
//!
//! 申报 4 份工作, 分发给并发工作者, finalize 阻塞到全部完成。
//!
//! # 运行
//! ```bash
//! cargo run --example workers
//! ```

use std::thread;
use std::time::Duration;

use syncport::{AtomicCounter, WaitGroup};

fn main() {
    let wg = WaitGroup::init();
    let total = AtomicCounter::init(0);

    assert!(wg.add(4));

    let wg = &wg;
    let total = &total;

    thread::scope(|s| {
        for id in 0..4u32 {
            s.spawn(move || {
                // 模拟不等长的工作
                thread::sleep(Duration::from_millis(10 * (id as u64 + 1)));
                total.add(id + 1);
                println!("worker {id} done");
                wg.done();
            });
        }

        // 同时是 "等待" 与 "销毁": 返回即全部完成
        wg.finalize();
        println!("all workers finished, total = {}", total.get());
    });

    assert!(!wg.is_initialized());
}
