//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器实现
//!
//! 单核、固定优先级的抢占式调度器。全部状态集中在 `Kernel` 上下文对象里：
//! - 进程表 (固定数组，下标即 pid)
//! - 就绪链表：优先级降序，同优先级先进先出，轮转由每次调度把
//!   被抢占的进程插回本级末尾实现
//! - 睡眠链表：唤醒时刻升序
//! - 空闲链表：空闲槽位
//!
//! 调度器本身从不跳转：它只决定谁应该占用 CPU (`active`)。
//! 真正的上下文切换由调用者在释放内核锁之后通过 `take_switch` + `Arch::switch` 完成。
//! 阻塞操作返回 `Block::Blocked`，进程恢复运行后用 `resume` 取回结果。

use core::marker::PhantomData;
use log::{debug, trace, warn};

use crate::arch::{Arch, Entry};
use crate::config::{IDLE_PRIO, KERNEL_STACK_WORDS, MAX_PRIO, MAX_USER_STACK, MIN_PRIO, NBPROC};
use crate::errno::{KResult, KernelError};
use crate::ipc::queue::QueueTable;
use crate::list::{self, TaskList};
use crate::mm::MemPool;
use crate::process::pid::{check_pid, Pid, PID_IDLE};
use crate::process::task::{CpuContext, ProcState, SpawnFlags, Task, Wakeup};
use super::clock::Clock;

const WORD: usize = core::mem::size_of::<usize>();

/// 用户栈对齐
const USER_STACK_ALIGN: usize = 16;

/// 可能阻塞的操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<T> {
    /// 同步完成
    Ready(T),
    /// 调用者已挂起，结果在恢复后由 `Kernel::resume` 给出
    Blocked,
}

impl<T> Block<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Block<U> {
        match self {
            Block::Ready(v) => Block::Ready(f(v)),
            Block::Blocked => Block::Blocked,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Block::Blocked)
    }
}

/// 阻塞操作恢复后的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumed {
    /// 接收到消息
    Received(i32),
    /// 消息已发送
    Sent,
    /// 子进程已回收
    Reaped { pid: Pid, retval: i32 },
}

pub struct Kernel<A: Arch> {
    /// 进程表
    pub(crate) tasks: [Task; NBPROC],

    /// 消息队列表
    pub(crate) queues: QueueTable,

    /// 就绪链表
    runnable: TaskList,

    /// 睡眠链表
    asleep: TaskList,

    /// 空闲链表
    free: TaskList,

    /// 应当占用 CPU 的进程
    active: Pid,

    /// 实际在 CPU 上的进程（最近一次 take_switch 之后）
    on_cpu: Pid,

    pub(crate) clock: Clock,

    /// 用户栈和队列缓冲区的内存池
    pub(crate) pool: MemPool,

    /// 上下文切换次数
    switches: u64,

    _arch: PhantomData<fn() -> A>,
}

// 进程表中的裸指针（内存池块）只在持有内核锁时访问
unsafe impl<A: Arch> Send for Kernel<A> {}

impl<A: Arch> Kernel<A> {
    pub const fn new() -> Self {
        Self {
            tasks: [Task::EMPTY; NBPROC],
            queues: QueueTable::new(),
            runnable: TaskList::new(),
            asleep: TaskList::new(),
            free: TaskList::new(),
            active: PID_IDLE,
            on_cpu: PID_IDLE,
            clock: Clock::new(),
            pool: MemPool::new(),
            switches: 0,
            _arch: PhantomData,
        }
    }

    /// 初始化进程表
    ///
    /// 调用者从此成为 0 号 idle 进程；1..NBPROC 依次挂到空闲链表上。
    pub fn setup(&mut self, pool_region: &'static mut [u8]) {
        self.pool.init(pool_region);

        for pid in 0..NBPROC {
            self.tasks[pid].pid = pid;
            self.tasks[pid].parent = None;
            self.tasks[pid].state = ProcState::Dead { next: None };
        }
        for pid in (1..NBPROC).rev() {
            self.free.push_front(&mut self.tasks, pid);
        }

        let idle = &mut self.tasks[PID_IDLE];
        idle.set_name("idle");
        idle.prio = IDLE_PRIO;
        idle.state = ProcState::Running;
        self.active = PID_IDLE;
        self.on_cpu = PID_IDLE;

        debug!("sched: {} process slots, {} bytes of pool", NBPROC, self.pool.size());
    }

    // ------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------

    /// 当前进程
    #[inline]
    pub fn getpid(&self) -> Pid {
        self.active
    }

    /// 非空闲槽位
    pub fn task(&self, pid: Pid) -> KResult<&Task> {
        let task = &self.tasks[check_pid(pid)?];
        if task.is_dead() {
            return Err(KernelError::NoSuchProcess);
        }
        Ok(task)
    }

    /// 尚未终止的进程
    fn alive(&self, pid: Pid) -> KResult<&Task> {
        let task = self.task(pid)?;
        if task.is_zombie() {
            return Err(KernelError::AlreadyTerminated);
        }
        Ok(task)
    }

    pub fn getprio(&self, pid: Pid) -> KResult<u32> {
        Ok(self.task(pid)?.prio())
    }

    pub fn getpname(&self, pid: Pid) -> KResult<&str> {
        Ok(self.task(pid)?.name())
    }

    /// 就绪链表（调度顺序）
    pub fn runnable(&self) -> list::Iter<'_> {
        self.runnable.iter(&self.tasks)
    }

    /// 睡眠链表（唤醒顺序）
    pub fn sleeping(&self) -> list::Iter<'_> {
        self.asleep.iter(&self.tasks)
    }

    /// 空闲槽位数
    pub fn free_slots(&self) -> usize {
        self.free.len(&self.tasks)
    }

    pub fn switch_count(&self) -> u64 {
        self.switches
    }

    /// 内存池剩余字节数
    pub fn pool_free(&self) -> usize {
        self.pool.free_bytes()
    }

    // ------------------------------------------------------------
    // 链表维护
    // ------------------------------------------------------------

    fn push_runnable(&mut self, pid: Pid) {
        debug_assert!(!matches!(self.tasks[pid].state, ProcState::Runnable { .. }));
        self.tasks[pid].state = ProcState::Runnable { next: None };
        self.runnable.insert_by_prio(&mut self.tasks, pid);
    }

    /// 释放槽位，归还用户栈
    fn push_dead(&mut self, pid: Pid) {
        if let Some(stack) = self.tasks[pid].user_stack.take() {
            self.pool.free(stack);
        }
        let task = &mut self.tasks[pid];
        task.parent = None;
        task.wakeup = None;
        task.ssize = 0;
        task.state = ProcState::Dead { next: None };
        self.free.push_front(&mut self.tasks, pid);
    }

    /// 从当前所在的链表上摘下（就绪/睡眠/队列等待）
    fn detach(&mut self, pid: Pid) {
        match self.tasks[pid].state {
            ProcState::Runnable { .. } => {
                self.runnable.remove(&mut self.tasks, pid);
            }
            ProcState::Asleep { .. } => {
                self.asleep.remove(&mut self.tasks, pid);
            }
            ProcState::WaitingQueueEmpty { fid, .. } => {
                self.queues.slot_mut(fid).receivers.remove(&mut self.tasks, pid);
            }
            ProcState::WaitingQueueFull { fid, .. } => {
                self.queues.slot_mut(fid).senders.remove(&mut self.tasks, pid);
            }
            _ => {}
        }
    }

    /// 挂起当前进程，进入 `state`；调用者负责把它插入对应的链表
    pub(crate) fn block_current(&mut self, state: ProcState) -> Pid {
        let pid = self.active;
        assert!(pid != PID_IDLE, "idle process cannot block");
        self.detach(pid);
        self.tasks[pid].state = state;
        self.tasks[pid].wakeup = None;
        pid
    }

    /// 唤醒一个已从等待链表上摘下的进程
    pub(crate) fn wake(&mut self, pid: Pid, wakeup: Option<Wakeup>) {
        self.tasks[pid].wakeup = wakeup;
        self.push_runnable(pid);
    }

    // ------------------------------------------------------------
    // 调度
    // ------------------------------------------------------------

    /// 完整的调度：先唤醒到期的睡眠进程，再决定是否换人
    ///
    /// 当前进程不再运行，或者就绪链表头的优先级不低于它时切换；
    /// 仍在运行的当前进程插回本优先级末尾。
    pub fn tick_scheduler(&mut self) {
        let now = self.clock.now();
        while let Some(head) = self.asleep.head() {
            match self.tasks[head].state {
                ProcState::Asleep { wake_tick, .. } if wake_tick <= now => {}
                _ => break,
            }
            self.asleep.pop_front(&mut self.tasks);
            trace!("sched: pid {} woke at tick {}", head, now);
            self.push_runnable(head);
        }

        let prev = self.active;
        let prev_running = self.tasks[prev].state == ProcState::Running;

        let Some(head) = self.runnable.head() else {
            assert!(prev_running, "runnable list empty and nothing running");
            return;
        };
        if prev_running && self.tasks[head].prio < self.tasks[prev].prio {
            return;
        }

        self.runnable.pop_front(&mut self.tasks);
        if prev_running {
            self.push_runnable(prev);
        }
        self.tasks[head].state = ProcState::Running;
        self.active = head;
        trace!("sched: pid {} -> pid {}", prev, head);
    }

    /// 只有当前进程不再运行或被更高优先级超过时才调度
    pub fn fix_scheduler(&mut self) {
        let active = &self.tasks[self.active];
        let outranked = self.runnable.head()
            .map_or(false, |head| active.prio < self.tasks[head].prio);
        if active.state != ProcState::Running || outranked {
            self.tick_scheduler();
        }
    }

    /// 取出待执行的上下文切换
    ///
    /// 调度决定与 CPU 上的进程不同时返回 (prev, next)，
    /// 调用者在释放内核锁之后交给 `Arch::switch`。
    pub fn take_switch(&mut self) -> Option<(*mut CpuContext, *const CpuContext)> {
        if self.on_cpu == self.active {
            return None;
        }
        let prev = self.on_cpu;
        let next = self.active;
        self.on_cpu = next;
        self.switches += 1;

        let prev_ctx: *mut CpuContext = &mut self.tasks[prev].context;
        let next_ctx: *const CpuContext = &self.tasks[next].context;
        Some((prev_ctx, next_ctx))
    }

    // ------------------------------------------------------------
    // 进程生命周期
    // ------------------------------------------------------------

    /// 创建进程
    ///
    /// `ssize` 是用户栈大小（USER）或内核栈需求（其他），单位字节。
    /// 不带 BACKGROUND 时创建后立即检查是否需要抢占。
    pub fn spawn(
        &mut self,
        entry: Entry,
        ssize: usize,
        prio: u32,
        name: &str,
        arg: usize,
        flags: SpawnFlags,
    ) -> KResult<Pid> {
        if !(MIN_PRIO..=MAX_PRIO).contains(&prio) {
            return Err(KernelError::InvalidPriority);
        }
        let user = flags.contains(SpawnFlags::USER);
        if user {
            if ssize > MAX_USER_STACK {
                return Err(KernelError::StackTooLarge);
            }
        } else if ssize / WORD > KERNEL_STACK_WORDS {
            return Err(KernelError::StackTooLarge);
        }

        let pid = self.free.pop_front(&mut self.tasks)
            .ok_or(KernelError::OutOfProcesses)?;

        // 用户栈额外预留两个字（返回地址和参数），按字向上取整
        let user_stack = if user {
            let size = (ssize + 2 * WORD + WORD - 1) & !(WORD - 1);
            match self.pool.alloc(size, USER_STACK_ALIGN) {
                Ok(block) => Some(block),
                Err(e) => {
                    self.free.push_front(&mut self.tasks, pid);
                    return Err(e);
                }
            }
        } else {
            None
        };

        let parent = self.active;
        let task = &mut self.tasks[pid];
        task.set_name(name);
        task.prio = prio;
        task.parent = Some(parent);
        task.wakeup = None;
        task.ssize = user_stack.map_or(0, |b| b.size());
        task.user_stack = user_stack;
        let kstack_top = task.kernel_stack_top();
        match user_stack {
            Some(stack) => {
                let ustack_top = stack.end() & !(USER_STACK_ALIGN - 1);
                A::prepare_user(&mut task.context, kstack_top, ustack_top, entry, arg);
            }
            None => A::prepare_kernel(&mut task.context, kstack_top, entry, arg),
        }

        self.push_runnable(pid);
        debug!("sched: spawned pid {} '{}' prio {} parent {}{}",
               pid, name, prio, parent, if user { " (user)" } else { "" });

        if !flags.contains(SpawnFlags::BACKGROUND) {
            self.fix_scheduler();
        }
        Ok(pid)
    }

    pub fn start(&mut self, entry: Entry, ssize: usize, prio: u32, name: &str, arg: usize) -> KResult<Pid> {
        self.spawn(entry, ssize, prio, name, arg, SpawnFlags::empty())
    }

    pub fn start_background(&mut self, entry: Entry, ssize: usize, prio: u32, name: &str, arg: usize) -> KResult<Pid> {
        self.spawn(entry, ssize, prio, name, arg, SpawnFlags::BACKGROUND)
    }

    pub fn start_user(&mut self, entry: Entry, ssize: usize, prio: u32, name: &str, arg: usize) -> KResult<Pid> {
        self.spawn(entry, ssize, prio, name, arg, SpawnFlags::USER)
    }

    pub fn start_user_background(&mut self, entry: Entry, ssize: usize, prio: u32, name: &str, arg: usize) -> KResult<Pid> {
        self.spawn(entry, ssize, prio, name, arg, SpawnFlags::USER | SpawnFlags::BACKGROUND)
    }

    /// 终止进程（exit、kill 和入口函数返回的共同路径）
    ///
    /// 子进程变为孤儿，已经僵死的子进程直接释放；
    /// 有父进程时进入僵死状态并唤醒正在等待它的父进程，否则直接释放。
    pub fn stop(&mut self, pid: Pid, retval: i32) -> KResult<i32> {
        check_pid(pid)?;
        if pid == PID_IDLE {
            warn!("sched: refusing to stop the idle process");
            return Err(KernelError::InvalidPid);
        }
        self.alive(pid)?;

        for child in 0..NBPROC {
            if self.tasks[child].parent != Some(pid) {
                continue;
            }
            if self.tasks[child].is_zombie() {
                debug!("sched: reaping orphaned zombie pid {}", child);
                self.push_dead(child);
            } else {
                self.tasks[child].parent = None;
            }
        }

        self.detach(pid);
        self.tasks[pid].wakeup = None;
        match self.tasks[pid].parent {
            None => self.push_dead(pid),
            Some(parent) => {
                self.tasks[pid].state = ProcState::Zombie { retval };
                if let ProcState::WaitingChild { target } = self.tasks[parent].state {
                    if target.map_or(true, |t| t == pid) {
                        self.wake(parent, Some(Wakeup::Child(pid)));
                    }
                }
            }
        }
        debug!("sched: pid {} stopped, retval {}", pid, retval);

        self.fix_scheduler();
        Ok(retval)
    }

    /// 当前进程退出
    pub fn exit(&mut self, retval: i32) {
        let pid = self.active;
        if let Err(e) = self.stop(pid, retval) {
            warn!("sched: exit from pid {} rejected: {}", pid, e);
        }
    }

    pub fn kill(&mut self, pid: Pid) -> KResult<()> {
        self.stop(pid, 0).map(|_| ())
    }

    /// 修改优先级，返回旧值
    pub fn chprio(&mut self, pid: Pid, prio: u32) -> KResult<u32> {
        check_pid(pid)?;
        if pid == PID_IDLE {
            warn!("sched: refusing to change idle priority");
            return Err(KernelError::InvalidPid);
        }
        let old = self.alive(pid)?.prio();
        if !(MIN_PRIO..=MAX_PRIO).contains(&prio) {
            return Err(KernelError::InvalidPriority);
        }
        if old == prio {
            return Ok(old);
        }

        self.tasks[pid].prio = prio;
        match self.tasks[pid].state {
            ProcState::Runnable { .. } => self.runnable.reposition(&mut self.tasks, pid),
            ProcState::WaitingQueueEmpty { fid, .. } => {
                self.queues.slot_mut(fid).receivers.reposition(&mut self.tasks, pid);
            }
            ProcState::WaitingQueueFull { fid, .. } => {
                self.queues.slot_mut(fid).senders.reposition(&mut self.tasks, pid);
            }
            _ => {}
        }
        trace!("sched: pid {} prio {} -> {}", pid, old, prio);

        self.fix_scheduler();
        Ok(old)
    }

    /// 睡眠到时钟计数达到 `wake_tick`
    ///
    /// 同一时刻的睡眠者按入睡顺序醒来；已经过去的时刻等价于让出 CPU。
    pub fn sleep_until(&mut self, wake_tick: u64) {
        let pid = self.block_current(ProcState::Asleep { wake_tick, next: None });
        self.asleep.insert_before(&mut self.tasks, pid, |new, node| {
            wake_tick_of(new) < wake_tick_of(node)
        });
        trace!("sched: pid {} sleeps until tick {}", pid, wake_tick);
        self.tick_scheduler();
    }

    /// 等待子进程结束
    ///
    /// `target` 为 None 表示任意子进程。已有僵死子进程时立即回收，
    /// 否则挂起，由子进程终止时唤醒，恢复后 `resume` 完成回收。
    pub fn waitpid(&mut self, target: Option<Pid>) -> KResult<Block<(Pid, i32)>> {
        let me = self.active;
        let zombie = match target {
            Some(pid) => {
                let child = self.task(pid).map_err(|e| match e {
                    KernelError::NoSuchProcess => KernelError::NoSuchChild,
                    e => e,
                })?;
                if child.parent() != Some(me) {
                    return Err(KernelError::NoSuchChild);
                }
                child.is_zombie().then_some(pid)
            }
            None => {
                let mut children = self.tasks.iter()
                    .filter(|t| t.parent() == Some(me) && !t.is_dead())
                    .peekable();
                if children.peek().is_none() {
                    return Err(KernelError::NoSuchChild);
                }
                children.find(|t| t.is_zombie()).map(|t| t.pid())
            }
        };

        if let Some(child) = zombie {
            return Ok(Block::Ready(self.reap(child)));
        }

        let pid = self.block_current(ProcState::WaitingChild { target });
        trace!("sched: pid {} waits for {:?}", pid, target);
        self.tick_scheduler();
        Ok(Block::Blocked)
    }

    /// 回收僵死进程，返回 (pid, retval)
    fn reap(&mut self, child: Pid) -> (Pid, i32) {
        let ProcState::Zombie { retval } = self.tasks[child].state else {
            panic!("reaping pid {} which is not a zombie", child);
        };
        self.push_dead(child);
        debug!("sched: reaped pid {}, retval {}", child, retval);
        (child, retval)
    }

    /// 取回当前进程上一次阻塞操作的结果
    ///
    /// 没有待取结果（例如从睡眠中醒来）时返回 None。
    pub fn resume(&mut self) -> Option<KResult<Resumed>> {
        let me = self.active;
        let wakeup = self.tasks[me].wakeup.take()?;
        Some(match wakeup {
            Wakeup::Message(message) => Ok(Resumed::Received(message)),
            Wakeup::Sent => Ok(Resumed::Sent),
            Wakeup::Aborted => Err(KernelError::Interrupted),
            Wakeup::Child(child) => {
                let task = &self.tasks[child];
                if task.is_zombie() && task.parent() == Some(me) {
                    let (pid, retval) = self.reap(child);
                    Ok(Resumed::Reaped { pid, retval })
                } else {
                    Err(KernelError::NoSuchChild)
                }
            }
        })
    }
}

impl<A: Arch> Default for Kernel<A> {
    fn default() -> Self {
        Self::new()
    }
}

fn wake_tick_of(task: &Task) -> u64 {
    match task.state {
        ProcState::Asleep { wake_tick, .. } => wake_tick,
        _ => u64::MAX,
    }
}
