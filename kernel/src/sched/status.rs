//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程与队列快照
//!
//! 供 `ps` / 队列状态之类的工具使用。调用者提供缓冲区，
//! 返回真实总数（可能大于缓冲区长度）。

use crate::arch::Arch;
use crate::config::PROC_NAME_LEN;
use crate::process::pid::pid_to_abi;
use crate::process::task::ProcStateKind;
use super::sched::Kernel;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub pid: i32,
    pub parent: i32,
    /// NUL 结尾的进程名
    pub name: [u8; PROC_NAME_LEN],
    pub prio: i32,
    pub state: ProcStateKind,
    pub ssize: usize,
}

impl ProcessStatus {
    pub const EMPTY: ProcessStatus = ProcessStatus {
        pid: -1,
        parent: -1,
        name: [0; PROC_NAME_LEN],
        prio: 0,
        state: ProcStateKind::Dead,
        ssize: 0,
    };

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(PROC_NAME_LEN);
        core::str::from_utf8(&self.name[..len]).unwrap_or("")
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub fid: i32,
    pub capacity: i32,
    /// 与 pcount 相同的带符号计数
    pub count: i32,
}

impl QueueStatus {
    pub const EMPTY: QueueStatus = QueueStatus { fid: -1, capacity: 0, count: 0 };
}

impl<A: Arch> Kernel<A> {
    /// 按 pid 顺序填写所有非空闲进程，返回进程总数
    pub fn processes_status(&self, out: &mut [ProcessStatus]) -> usize {
        let live = self.tasks.iter().filter(|t| !t.is_dead());
        let mut total = 0;
        for task in live {
            if let Some(slot) = out.get_mut(total) {
                *slot = ProcessStatus {
                    pid: task.pid() as i32,
                    parent: pid_to_abi(task.parent()),
                    name: task.name_bytes(),
                    prio: task.prio() as i32,
                    state: task.state().kind(),
                    ssize: task.ssize,
                };
            }
            total += 1;
        }
        total
    }

    /// 按队列号顺序填写所有正在使用的队列，返回队列总数
    pub fn queues_status(&self, out: &mut [QueueStatus]) -> usize {
        let mut total = 0;
        for (fid, queue) in self.queues.iter_used() {
            if let Some(slot) = out.get_mut(total) {
                let count = self.pcount(fid).map_or(0, |c| c.legacy());
                *slot = QueueStatus {
                    fid: fid as i32,
                    capacity: queue.capacity() as i32,
                    count,
                };
            }
            total += 1;
        }
        total
    }
}
