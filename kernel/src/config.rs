//! Kestrel 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "Kestrel";

/// 内核版本
pub const KERNEL_VERSION: &str = "0.1.0";

// ============================================================
// 进程配置
// ============================================================

/// 进程表大小（含 0 号 idle 进程）
pub const NBPROC: usize = 30;

/// 最低合法优先级
pub const MIN_PRIO: u32 = 1;

/// 最高合法优先级
pub const MAX_PRIO: u32 = 256;

/// idle 进程专用优先级
pub const IDLE_PRIO: u32 = 0;

/// 内核栈大小（字）
pub const KERNEL_STACK_WORDS: usize = 1024;

/// 用户栈上限（字节）
pub const MAX_USER_STACK: usize = 1073741824;

/// 进程名缓冲区长度（含结尾 NUL）
pub const PROC_NAME_LEN: usize = 20;

// ============================================================
// 消息队列配置
// ============================================================

/// 消息队列表大小
pub const NBQUEUE: usize = 300;

/// 单个队列容量上限
pub const MAX_QUEUE_CAPACITY: usize = 1000000000;

// ============================================================
// 时钟配置
// ============================================================

/// 时钟晶振频率 (Hz)
pub const QUARTZ: u64 = 1193181;

/// 时钟中断频率 (Hz)
pub const CLOCKFREQ: u64 = 200;

/// 调度频率 (Hz)
pub const SCHEDFREQ: u64 = 50;

// ============================================================
// 内存配置
// ============================================================

/// 内存池大小（字节）
pub const POOL_SIZE: usize = 4194304;

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "info";
