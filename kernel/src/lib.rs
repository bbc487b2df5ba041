//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! Kestrel 教学内核
//!
//! 单核、固定优先级抢占式调度的进程管理内核：
//! - 进程创建、终止、父子回收与优先级修改
//! - 基于时钟中断计数的睡眠
//! - 有界整数消息队列，以及建立在其上的信号量
//!
//! 调度状态全部在 `sched::Kernel` 中；硬件相关部分通过 `arch::Arch` 接入。
//! riscv64 上提供裸机后端，其他目标（包括宿主机测试）使用模拟后端。

#![cfg_attr(not(test), no_std)]

extern crate log;

#[macro_use]
pub mod print;

pub mod config;
pub mod console;
pub mod errno;
pub mod logger;

pub mod arch;
pub mod list;
pub mod mm;
pub mod process;
pub mod sched;
pub mod ipc;
pub mod sync;
pub mod syscall;

#[cfg(test)]
mod tests;

pub use arch::{Arch, Entry, Native};
pub use errno::{Errno, KResult, KernelError};
pub use sched::{Block, Kernel, Resumed};
