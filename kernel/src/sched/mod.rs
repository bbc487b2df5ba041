//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! - `sched`: `Kernel` 上下文对象，调度与进程生命周期
//! - `clock`: 时钟中断计数与调度频率
//! - `status`: 进程与队列快照

pub mod sched;
pub mod clock;
pub mod status;

pub use sched::{Block, Kernel, Resumed};
pub use clock::{clock_settings, Clock, TICKS_PER_SCHED};
pub use status::{ProcessStatus, QueueStatus};
