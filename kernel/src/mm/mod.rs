//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内存管理模块

pub mod pool;

pub use pool::{MemPool, PoolBlock};
