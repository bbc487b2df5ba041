//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 同步原语 (Synchronization Primitives)
//!
//! 信号量和互斥锁都由消息队列实现，阻塞语义与队列一致：
//! - P 操作 (down / lock): 接收令牌
//! - V 操作 (up / unlock): 发送令牌

pub mod semaphore;

pub use semaphore::{Mutex, Semaphore};
