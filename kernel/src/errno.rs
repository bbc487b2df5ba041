//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 错误代码定义
//!
//! - `Errno`: 系统调用边界上的 Linux 风格错误号 (include/uapi/asm-generic/errno-base.h)
//! - `KernelError`: 内核内部的错误分类，每一种对应唯一的 `Errno`
//!
//! 内核内部一律返回 `KResult<T>`，只在系统调用边界上编码成负数。

use core::fmt;

/// 标准错误代码
///
/// 使用方法：
/// ```rust,ignore
/// use crate::errno::{Errno, KernelError};
///
/// // 系统调用返回负数
/// let ret = KernelError::NoSuchChild.errno().as_neg_i32();
/// assert_eq!(ret, -(Errno::NoChild as i32));
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// Operation not permitted (EPERM, 1)
    OperationNotPermitted = 1,

    /// No such process (ESRCH, 3)
    NoSuchProcess = 3,

    /// Interrupted system call (EINTR, 4)
    InterruptedSystemCall = 4,

    /// Argument list too long (E2BIG, 7)
    ArgumentListTooLong = 7,

    /// Bad file number (EBADF, 9)
    BadFileNumber = 9,

    /// No child process (ECHILD, 10)
    NoChild = 10,

    /// Try again (EAGAIN, 11)
    TryAgain = 11,

    /// Out of memory (ENOMEM, 12)
    OutOfMemory = 12,

    /// Bad address (EFAULT, 14)
    BadAddress = 14,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// No space left on device (ENOSPC, 28)
    NoSpaceLeftOnDevice = 28,

    /// Function not implemented (ENOSYS, 38)
    FunctionNotImplemented = 38,
}

impl Errno {
    /// 获取错误代码的正数值（用于比较）
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 获取错误代码的负数值（用于系统调用返回）
    #[inline]
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }
}

/// 常用的错误代码常量
pub mod constants {
    pub const EPERM: i32 = 1;
    pub const ESRCH: i32 = 3;
    pub const EINTR: i32 = 4;
    pub const E2BIG: i32 = 7;
    pub const EBADF: i32 = 9;
    pub const ECHILD: i32 = 10;
    pub const EAGAIN: i32 = 11;
    pub const ENOMEM: i32 = 12;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const ENOSPC: i32 = 28;
    pub const ENOSYS: i32 = 38;
}

/// 内核错误
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// pid 越界，或者操作 idle 进程
    InvalidPid,
    /// pid 合法但槽位空闲
    NoSuchProcess,
    /// 目标不是调用者的（存活或僵死）子进程
    NoSuchChild,
    /// 优先级不在 MIN_PRIO..=MAX_PRIO 内
    InvalidPriority,
    /// 进程表已满
    OutOfProcesses,
    /// 栈大小超过上限
    StackTooLarge,
    /// 内存池耗尽
    OutOfMemory,
    /// 队列号越界或队列空闲
    InvalidQueueId,
    /// 队列容量 <= 0
    InvalidCapacity,
    /// 队列容量超过上限
    CapacityTooLarge,
    /// 队列表已满
    OutOfQueues,
    /// 进程已经是僵死状态
    AlreadyTerminated,
    /// 阻塞期间队列被删除或重置
    Interrupted,
}

impl KernelError {
    /// 系统调用边界上使用的错误号
    pub const fn errno(self) -> Errno {
        match self {
            KernelError::InvalidPid => Errno::InvalidArgument,
            KernelError::NoSuchProcess => Errno::NoSuchProcess,
            KernelError::NoSuchChild => Errno::NoChild,
            KernelError::InvalidPriority => Errno::InvalidArgument,
            KernelError::OutOfProcesses => Errno::TryAgain,
            KernelError::StackTooLarge => Errno::ArgumentListTooLong,
            KernelError::OutOfMemory => Errno::OutOfMemory,
            KernelError::InvalidQueueId => Errno::BadFileNumber,
            KernelError::InvalidCapacity => Errno::InvalidArgument,
            KernelError::CapacityTooLarge => Errno::ArgumentListTooLong,
            KernelError::OutOfQueues => Errno::NoSpaceLeftOnDevice,
            KernelError::AlreadyTerminated => Errno::NoSuchProcess,
            KernelError::Interrupted => Errno::InterruptedSystemCall,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            KernelError::InvalidPid => "invalid pid",
            KernelError::NoSuchProcess => "no such process",
            KernelError::NoSuchChild => "no such child",
            KernelError::InvalidPriority => "invalid priority",
            KernelError::OutOfProcesses => "process table full",
            KernelError::StackTooLarge => "stack too large",
            KernelError::OutOfMemory => "out of memory",
            KernelError::InvalidQueueId => "invalid queue id",
            KernelError::InvalidCapacity => "invalid queue capacity",
            KernelError::CapacityTooLarge => "queue capacity too large",
            KernelError::OutOfQueues => "queue table full",
            KernelError::AlreadyTerminated => "process already terminated",
            KernelError::Interrupted => "interrupted",
        };
        f.write_str(msg)
    }
}

/// 内核操作结果
pub type KResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_values() {
        assert_eq!(Errno::NoSuchProcess.as_i32(), 3);
        assert_eq!(Errno::NoChild.as_i32(), 10);
        assert_eq!(Errno::InvalidArgument.as_i32(), 22);
        assert_eq!(Errno::NoSpaceLeftOnDevice.as_i32(), 28);
    }

    #[test]
    fn test_errno_negative() {
        assert_eq!(Errno::NoChild.as_neg_i32(), -10);
        assert_eq!(Errno::InterruptedSystemCall.as_neg_i32(), -4);
    }

    #[test]
    fn test_errno_constants() {
        assert_eq!(constants::ESRCH, Errno::NoSuchProcess.as_i32());
        assert_eq!(constants::ECHILD, Errno::NoChild.as_i32());
        assert_eq!(constants::EINTR, Errno::InterruptedSystemCall.as_i32());
    }

    #[test]
    fn test_kernel_error_mapping() {
        assert_eq!(KernelError::NoSuchChild.errno(), Errno::NoChild);
        assert_eq!(KernelError::Interrupted.errno().as_i32(), constants::EINTR);
        assert_eq!(KernelError::OutOfQueues.errno().as_i32(), constants::ENOSPC);
        assert_eq!(KernelError::AlreadyTerminated.errno(), Errno::NoSuchProcess);
    }
}
