//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 架构相关代码
//!
//! 调度器只通过 `Arch` trait 接触硬件：初始化新进程的上下文，
//! 以及交换两个上下文。上下文内容对调度器是不透明的。
//!
//! 当前支持的后端：
//! - **RISC-V (riscv64)** - 裸机平台，naked 汇编实现上下文切换
//! - **sim** - 其他目标（包括宿主机测试）上的模拟后端，只记录切换

use crate::process::task::CpuContext;

#[cfg(target_arch = "riscv64")]
pub mod riscv64;

pub mod sim;

#[cfg(target_arch = "riscv64")]
pub use riscv64::Riscv64 as Native;

#[cfg(not(target_arch = "riscv64"))]
pub use sim::Sim as Native;

/// 进程入口函数：参数为创建时传入的 arg，返回值交给 exit
pub type Entry = extern "C" fn(usize) -> i32;

/// 上下文切换边界
pub trait Arch {
    /// 关中断守卫，离开作用域时恢复进入前的中断状态
    type IrqGuard;

    /// 关闭本地中断
    ///
    /// 内核锁只能在守卫存活期间获取，否则时钟中断会在同一个 CPU 上重入内核锁。
    /// 守卫可以嵌套。
    fn irq_save() -> Self::IrqGuard;

    /// 初始化内核态进程的上下文
    ///
    /// 首次切换到该上下文时从 `entry(arg)` 开始执行，
    /// 返回后以返回值调用 exit。
    fn prepare_kernel(ctx: &mut CpuContext, kstack_top: usize, entry: Entry, arg: usize);

    /// 初始化用户态进程的上下文，`ustack_top` 为用户栈栈顶
    fn prepare_user(ctx: &mut CpuContext, kstack_top: usize, ustack_top: usize, entry: Entry, arg: usize);

    /// 把当前寄存器保存到 `prev`，恢复 `next`
    ///
    /// 直到 `prev` 再次被切换回来才返回。
    ///
    /// # Safety
    ///
    /// - 两个指针都指向有效的 `CpuContext`，且在切换期间不被其他代码访问
    /// - `next` 由 `prepare_*` 初始化过或由此前的切换保存
    /// - 调用时不能持有内核锁，但必须持有 `irq_save` 的守卫，
    ///   从 `take_switch` 到本函数返回之间不能被中断
    unsafe fn switch(prev: *mut CpuContext, next: *const CpuContext);
}
