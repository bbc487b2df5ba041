//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! PID 管理
//!
//! PID 就是进程表下标：
//! - PID 0: idle 进程，永不销毁
//! - PID 1..NBPROC: 普通进程，槽位空闲时挂在空闲链表上
//!
//! 系统调用边界上使用 `i32`，-1 表示"无"或"任意子进程"。

use crate::config::NBPROC;
use crate::errno::{KResult, KernelError};

/// 进程号（进程表下标）
pub type Pid = usize;

/// idle 进程
pub const PID_IDLE: Pid = 0;

/// 系统调用边界上的"无进程"
pub const NOPID: i32 = -1;

/// 检查下标是否在进程表范围内
#[inline]
pub fn check_pid(pid: Pid) -> KResult<Pid> {
    if pid < NBPROC {
        Ok(pid)
    } else {
        Err(KernelError::InvalidPid)
    }
}

/// 把系统调用传入的 pid 转换为下标
pub fn pid_from_abi(pid: i32) -> KResult<Pid> {
    if pid < 0 {
        return Err(KernelError::InvalidPid);
    }
    check_pid(pid as Pid)
}

/// 把可选的 pid 编码为系统调用返回值
#[inline]
pub fn pid_to_abi(pid: Option<Pid>) -> i32 {
    pid.map_or(NOPID, |p| p as i32)
}
