//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程管理模块
//!
//! - `pid`: 进程号与合法性检查
//! - `task`: 进程控制块与进程状态

pub mod pid;
pub mod task;

pub use pid::{Pid, PID_IDLE, NOPID};
pub use task::{CpuContext, ProcState, ProcStateKind, SpawnFlags, Task, Wakeup};
