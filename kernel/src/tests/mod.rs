//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 场景测试
//!
//! 在模拟后端上驱动完整的 `Kernel`：测试代码总是以"当前进程"的身份调用内核操作，
//! 调度决定谁是当前进程。进程体不会真正执行，`run_to_exit` 代替它运行入口函数
//! 并以返回值退出。
//!
//! 运行测试：
//! ```bash
//! cargo test --package kestrel
//! ```

use crate::arch::sim::Sim;
use crate::process::pid::Pid;
use crate::sched::Kernel;

mod scheduler;
mod process_tree;
mod semaphore;

pub(crate) type SimKernel = Kernel<Sim>;

/// 测试用内存池大小
pub(crate) const TEST_POOL: usize = 256 * 1024;

/// 初始化好的内核，调用者是 idle 进程
pub(crate) fn boot() -> Box<SimKernel> {
    let mut kernel = Box::new(Kernel::new());
    let region: &'static mut [u8] = Box::leak(vec![0u8; TEST_POOL].into_boxed_slice());
    kernel.setup(region);
    kernel
}

/// 启动一个优先级为 `prio` 的测试进程并切换到它
pub(crate) fn boot_as(prio: u32) -> (Box<SimKernel>, Pid) {
    let mut kernel = boot();
    let pid = kernel.start(ret_arg, 0, prio, "test", 0).unwrap();
    assert_eq!(kernel.getpid(), pid);
    (kernel, pid)
}

/// 执行当前进程的入口函数，以返回值退出
pub(crate) fn run_to_exit(kernel: &mut SimKernel) -> Pid {
    let pid = kernel.getpid();
    let (entry, arg) = Sim::entry_of(kernel.task(pid).unwrap().context()).unwrap();
    kernel.exit(entry(arg));
    pid
}

pub(crate) extern "C" fn ret_arg(arg: usize) -> i32 {
    arg as i32
}

pub(crate) extern "C" fn ret_three(_: usize) -> i32 {
    3
}

/// 就绪链表中的 pid 序列
pub(crate) fn runnable(kernel: &SimKernel) -> Vec<Pid> {
    kernel.runnable().collect()
}
