//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程间通信
//!
//! 有界整数消息队列，同时也是信号量与互斥锁的基础。
//! - `queue`: 环形缓冲区与队列表
//! - `msgq`: 阻塞的发送/接收以及删除、重置、计数

pub mod queue;
pub mod msgq;

pub use queue::{Fid, MessageQueue, QueueTable};
pub use msgq::QueueCount;
