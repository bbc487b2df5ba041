//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 进程控制块 (Process Control Block)
//!
//! 每个进程占用进程表中的一个固定槽位，槽位下标就是 pid。
//!
//! 关键设计要点：
//! 1. 进程状态是带数据的枚举，每个状态只携带自己需要的字段
//! 2. 链表的 next 指针嵌在状态里，只有挂在链表上的状态才有 next，
//!    状态本身就说明进程当前属于哪条链表
//! 3. 内核栈内嵌在 PCB 中，用户栈从内存池分配

use crate::config::{KERNEL_STACK_WORDS, PROC_NAME_LEN};
use crate::mm::pool::PoolBlock;
use crate::ipc::queue::Fid;
use super::pid::Pid;

/// 链表后继（进程表下标）
pub type Link = Option<Pid>;

/// 进程状态
///
/// 带 `next` 字段的状态表示进程挂在某条链表上：
/// - `Dead`: 空闲链表
/// - `Runnable`: 就绪链表
/// - `Asleep`: 睡眠链表
/// - `WaitingQueueEmpty` / `WaitingQueueFull`: 对应队列的接收/发送等待链表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    /// 槽位空闲
    Dead { next: Link },

    /// 已终止，等待父进程回收
    Zombie { retval: i32 },

    /// 就绪，等待被调度
    Runnable { next: Link },

    /// 正在 CPU 上运行（全系统至多一个）
    Running,

    /// 睡眠到 `wake_tick`
    Asleep { wake_tick: u64, next: Link },

    /// 等待子进程结束，`target` 为 None 表示任意子进程
    WaitingChild { target: Option<Pid> },

    /// 队列为空，等待接收
    WaitingQueueEmpty { fid: Fid, next: Link },

    /// 队列已满，等待发送 `message`
    WaitingQueueFull { fid: Fid, message: i32, next: Link },
}

impl ProcState {
    /// 对外报告的状态编号
    pub const fn kind(&self) -> ProcStateKind {
        match self {
            ProcState::Dead { .. } => ProcStateKind::Dead,
            ProcState::Zombie { .. } => ProcStateKind::Zombie,
            ProcState::Runnable { .. } => ProcStateKind::Runnable,
            ProcState::Running => ProcStateKind::Running,
            ProcState::Asleep { .. } => ProcStateKind::Asleep,
            ProcState::WaitingChild { .. } => ProcStateKind::WaitChild,
            ProcState::WaitingQueueEmpty { .. } => ProcStateKind::WaitQueueEmpty,
            ProcState::WaitingQueueFull { .. } => ProcStateKind::WaitQueueFull,
        }
    }

    /// 当前状态的链表后继；不在链表上的状态返回 None
    pub(crate) fn link(&self) -> Option<Link> {
        match *self {
            ProcState::Dead { next }
            | ProcState::Runnable { next }
            | ProcState::Asleep { next, .. }
            | ProcState::WaitingQueueEmpty { next, .. }
            | ProcState::WaitingQueueFull { next, .. } => Some(next),
            _ => None,
        }
    }

    pub(crate) fn link_mut(&mut self) -> Option<&mut Link> {
        match self {
            ProcState::Dead { next }
            | ProcState::Runnable { next }
            | ProcState::Asleep { next, .. }
            | ProcState::WaitingQueueEmpty { next, .. }
            | ProcState::WaitingQueueFull { next, .. } => Some(next),
            _ => None,
        }
    }
}

/// 进程状态编号（`processes_status` 报告给用户态）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ProcStateKind {
    Dead = -2,
    Zombie = -1,
    Runnable = 0,
    Running = 1,
    Asleep = 2,
    WaitChild = 3,
    WaitQueueEmpty = 4,
    WaitQueueFull = 5,
}

/// 阻塞进程的结果槽，由唤醒者填写
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// 接收者直接收到的消息
    Message(i32),
    /// 发送者的消息已进入队列
    Sent,
    /// 等待的子进程已终止
    Child(Pid),
    /// 队列被删除或重置
    Aborted,
}

/// 创建进程的标志
pub mod spawn_flags {
    use bitflags::bitflags;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct SpawnFlags: u32 {
            /// 用户态进程，分配独立的用户栈
            const USER       = 1 << 0;
            /// 只放入就绪链表，不触发调度（启动阶段使用）
            const BACKGROUND = 1 << 1;
        }
    }
}

pub use spawn_flags::SpawnFlags;

/// CPU 上下文 - 进程切换时保存/恢复的寄存器
///
/// 布局与 riscv64 `cpu_switch_to` 一致：ra, sp, s0-s11。
/// 调度器不解释其中内容，只把指针交给 `Arch::switch`。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuContext {
    /// 返回地址
    pub ra: usize,
    /// 栈指针
    pub sp: usize,
    /// 被调用者保存寄存器 s0-s11
    pub s: [usize; 12],
}

impl CpuContext {
    pub const fn zeroed() -> Self {
        Self { ra: 0, sp: 0, s: [0; 12] }
    }
}

impl Default for CpuContext {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// 进程控制块
pub struct Task {
    /// 进程 ID（等于槽位下标）
    pub(crate) pid: Pid,

    /// 父进程，None 表示孤儿或根进程
    pub(crate) parent: Option<Pid>,

    /// 进程名，超长时截断
    name: [u8; PROC_NAME_LEN],
    name_len: usize,

    /// 优先级，越大越优先
    pub(crate) prio: u32,

    pub(crate) state: ProcState,

    /// 阻塞操作的结果槽
    pub(crate) wakeup: Option<Wakeup>,

    /// 创建时请求的栈大小（字节）
    pub(crate) ssize: usize,

    /// 用户栈，仅用户态进程持有
    pub(crate) user_stack: Option<PoolBlock>,

    /// 保存的 CPU 上下文
    pub(crate) context: CpuContext,

    /// 内核栈
    pub(crate) kernel_stack: [usize; KERNEL_STACK_WORDS],
}

impl Task {
    /// 空槽位
    pub const EMPTY: Task = Task {
        pid: 0,
        parent: None,
        name: [0; PROC_NAME_LEN],
        name_len: 0,
        prio: 0,
        state: ProcState::Dead { next: None },
        wakeup: None,
        ssize: 0,
        user_stack: None,
        context: CpuContext::zeroed(),
        kernel_stack: [0; KERNEL_STACK_WORDS],
    };

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    #[inline]
    pub fn prio(&self) -> u32 {
        self.prio
    }

    #[inline]
    pub fn state(&self) -> ProcState {
        self.state
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        matches!(self.state, ProcState::Dead { .. })
    }

    #[inline]
    pub fn is_zombie(&self) -> bool {
        matches!(self.state, ProcState::Zombie { .. })
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("")
    }

    /// 设置进程名，最多保留 PROC_NAME_LEN - 1 字节且不截断 UTF-8 字符
    pub(crate) fn set_name(&mut self, name: &str) {
        let mut len = name.len().min(PROC_NAME_LEN - 1);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.name = [0; PROC_NAME_LEN];
        self.name[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.name_len = len;
    }

    /// 名字的 NUL 结尾副本
    pub(crate) fn name_bytes(&self) -> [u8; PROC_NAME_LEN] {
        self.name
    }

    /// 内核栈栈顶（16 字节对齐）
    pub(crate) fn kernel_stack_top(&self) -> usize {
        let base = self.kernel_stack.as_ptr() as usize;
        (base + KERNEL_STACK_WORDS * core::mem::size_of::<usize>()) & !0xf
    }

    #[inline]
    pub fn context(&self) -> &CpuContext {
        &self.context
    }
}
