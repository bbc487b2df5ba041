//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 系统调用边界
//!
//! 系统调用分发层把编号映射到这里的函数。本层负责：
//! 1. 把 ABI 整数参数转换为内核类型
//! 2. 关中断后进入内核锁，锁内做出调度决定，释放锁后完成上下文切换
//! 3. 阻塞调用恢复后取回结果
//! 4. 把 `KResult` 编码为 ABI 返回值：成功为非负数，失败为 -errno
//!
//! 指针参数的合法性由分发层检查，这里直接使用。
//!
//! 内核锁只在 `A::irq_save` 的守卫之内获取。守卫一直保持到 `A::switch` 返回，
//! 时钟中断不会落在锁内，也不会落在调度决定与真正的切换之间。
//!
//! 阻塞调用在真实后端上于切换返回后（调用者重新运行时）直接取回结果。
//! 模拟后端的切换立即返回，此时调用者仍在等待，调用返回 -EAGAIN；
//! 调度回到调用者之后，用对应的 `*_resume` 函数取回结果。

use spin::Mutex;

use crate::arch::{Arch, Entry};
use crate::errno::{Errno, KResult, KernelError};
use crate::ipc::queue::Fid;
use crate::process::pid::{pid_from_abi, Pid};
use crate::process::task::SpawnFlags;
use crate::sched::{clock_settings, Block, Kernel, ProcessStatus, QueueStatus, Resumed};

#[inline]
fn neg(e: KernelError) -> i32 {
    e.errno().as_neg_i32()
}

fn encode(result: KResult<i32>) -> i32 {
    result.unwrap_or_else(neg)
}

fn fid_from_abi(fid: i32) -> KResult<Fid> {
    usize::try_from(fid).map_err(|_| KernelError::InvalidQueueId)
}

fn prio_from_abi(prio: i32) -> KResult<u32> {
    u32::try_from(prio).map_err(|_| KernelError::InvalidPriority)
}

/// 只读访问
fn inspect<A: Arch, T>(kernel: &Mutex<Kernel<A>>, op: impl FnOnce(&Kernel<A>) -> T) -> T {
    let _irq = A::irq_save();
    let guard = kernel.lock();
    op(&guard)
}

/// 在锁内执行操作并取出调度决定，释放锁后切换
fn call<A: Arch, T>(kernel: &Mutex<Kernel<A>>, op: impl FnOnce(&mut Kernel<A>) -> T) -> T {
    let _irq = A::irq_save();
    let (result, switch) = {
        let mut guard = kernel.lock();
        let result = op(&mut guard);
        (result, guard.take_switch())
    };
    if let Some((prev, next)) = switch {
        // SAFETY: 指针指向进程表中的上下文，锁已释放，中断关闭直到切换返回
        unsafe { A::switch(prev, next) };
    }
    result
}

/// 可能阻塞的调用的结果
enum Done<T> {
    /// 没有阻塞
    Now(T),
    /// 阻塞后被唤醒
    Later(Resumed),
}

/// 取回 `caller` 上一次阻塞操作的结果
///
/// 当前进程不是 `caller` 说明后端没有真正挂起调用者，结果还不存在。
fn resumed<A: Arch>(kernel: &Mutex<Kernel<A>>, caller: Option<Pid>) -> Result<Resumed, i32> {
    let _irq = A::irq_save();
    let mut guard = kernel.lock();
    if caller.is_some_and(|pid| pid != guard.getpid()) {
        return Err(Errno::TryAgain.as_neg_i32());
    }
    match guard.resume() {
        Some(Ok(r)) => Ok(r),
        Some(Err(e)) => Err(neg(e)),
        None => Err(Errno::TryAgain.as_neg_i32()),
    }
}

fn call_blocking<A: Arch, T>(
    kernel: &Mutex<Kernel<A>>,
    op: impl FnOnce(&mut Kernel<A>) -> KResult<Block<T>>,
) -> Result<Done<T>, i32> {
    let mut caller = None;
    let block = call(kernel, |k| {
        caller = Some(k.getpid());
        op(k)
    });
    match block.map_err(neg)? {
        Block::Ready(v) => Ok(Done::Now(v)),
        Block::Blocked => resumed(kernel, caller).map(Done::Later),
    }
}

fn finish_waitpid(done: Result<Done<(Pid, i32)>, i32>, retvalp: Option<&mut i32>) -> i32 {
    let (child, retval) = match done {
        Ok(Done::Now(reaped)) => reaped,
        Ok(Done::Later(Resumed::Reaped { pid, retval })) => (pid, retval),
        Ok(Done::Later(_)) => return neg(KernelError::NoSuchChild),
        Err(code) => return code,
    };
    if let Some(out) = retvalp {
        *out = retval;
    }
    child as i32
}

fn finish_psend(done: Result<Done<()>, i32>) -> i32 {
    match done {
        Ok(_) => 0,
        Err(code) => code,
    }
}

fn finish_preceive(done: Result<Done<i32>, i32>, message: Option<&mut i32>) -> i32 {
    let value = match done {
        Ok(Done::Now(value)) | Ok(Done::Later(Resumed::Received(value))) => value,
        Ok(Done::Later(_)) => return neg(KernelError::Interrupted),
        Err(code) => return code,
    };
    if let Some(out) = message {
        *out = value;
    }
    0
}

pub fn sys_start<A: Arch>(
    kernel: &Mutex<Kernel<A>>,
    entry: Entry,
    ssize: usize,
    prio: i32,
    name: &str,
    arg: usize,
    flags: SpawnFlags,
) -> i32 {
    encode(prio_from_abi(prio).and_then(|prio| {
        call(kernel, |k| k.spawn(entry, ssize, prio, name, arg, flags)).map(|pid| pid as i32)
    }))
}

pub fn sys_exit<A: Arch>(kernel: &Mutex<Kernel<A>>, retval: i32) {
    call(kernel, |k| k.exit(retval));
}

pub fn sys_kill<A: Arch>(kernel: &Mutex<Kernel<A>>, pid: i32) -> i32 {
    encode(pid_from_abi(pid).and_then(|pid| call(kernel, |k| k.kill(pid))).map(|_| 0))
}

/// `pid < 0` 等待任意子进程；成功返回子进程 pid，并写入返回值
pub fn sys_waitpid<A: Arch>(kernel: &Mutex<Kernel<A>>, pid: i32, retvalp: Option<&mut i32>) -> i32 {
    let target: Option<Pid> = if pid < 0 {
        None
    } else {
        match pid_from_abi(pid) {
            Ok(pid) => Some(pid),
            Err(e) => return neg(e),
        }
    };
    finish_waitpid(call_blocking(kernel, |k| k.waitpid(target)), retvalp)
}

/// 阻塞的 `sys_waitpid` 在调用者重新运行后的返回值
pub fn sys_waitpid_resume<A: Arch>(kernel: &Mutex<Kernel<A>>, retvalp: Option<&mut i32>) -> i32 {
    finish_waitpid(resumed(kernel, None).map(Done::Later), retvalp)
}

pub fn sys_getpid<A: Arch>(kernel: &Mutex<Kernel<A>>) -> i32 {
    inspect(kernel, |k| k.getpid() as i32)
}

pub fn sys_getprio<A: Arch>(kernel: &Mutex<Kernel<A>>, pid: i32) -> i32 {
    encode(pid_from_abi(pid).and_then(|pid| inspect(kernel, |k| k.getprio(pid))).map(|p| p as i32))
}

/// 成功返回旧优先级
pub fn sys_chprio<A: Arch>(kernel: &Mutex<Kernel<A>>, pid: i32, prio: i32) -> i32 {
    let result = pid_from_abi(pid).and_then(|pid| {
        let prio = prio_from_abi(prio)?;
        call(kernel, |k| k.chprio(pid, prio))
    });
    encode(result.map(|old| old as i32))
}

pub fn sys_wait_clock<A: Arch>(kernel: &Mutex<Kernel<A>>, clock: u64) {
    call(kernel, |k| k.sleep_until(clock));
}

pub fn sys_current_clock<A: Arch>(kernel: &Mutex<Kernel<A>>) -> u64 {
    inspect(kernel, |k| k.current_clock())
}

pub fn sys_clock_settings(quartz: Option<&mut u64>, ticks: Option<&mut u64>) {
    let (q, t) = clock_settings();
    if let Some(out) = quartz {
        *out = q;
    }
    if let Some(out) = ticks {
        *out = t;
    }
}

/// 时钟中断：计数并在调度点上抢占
pub fn on_timer_interrupt<A: Arch>(kernel: &Mutex<Kernel<A>>) {
    call(kernel, |k| k.timer_interrupt());
}

pub fn sys_pcreate<A: Arch>(kernel: &Mutex<Kernel<A>>, count: i32) -> i32 {
    encode(call(kernel, |k| k.pcreate(count)).map(|fid| fid as i32))
}

pub fn sys_pdelete<A: Arch>(kernel: &Mutex<Kernel<A>>, fid: i32) -> i32 {
    encode(fid_from_abi(fid).and_then(|fid| call(kernel, |k| k.pdelete(fid))).map(|_| 0))
}

pub fn sys_preset<A: Arch>(kernel: &Mutex<Kernel<A>>, fid: i32) -> i32 {
    encode(fid_from_abi(fid).and_then(|fid| call(kernel, |k| k.preset(fid))).map(|_| 0))
}

pub fn sys_psend<A: Arch>(kernel: &Mutex<Kernel<A>>, fid: i32, message: i32) -> i32 {
    let fid = match fid_from_abi(fid) {
        Ok(fid) => fid,
        Err(e) => return neg(e),
    };
    finish_psend(call_blocking(kernel, |k| k.psend(fid, message)))
}

/// 阻塞的 `sys_psend` 在调用者重新运行后的返回值
pub fn sys_psend_resume<A: Arch>(kernel: &Mutex<Kernel<A>>) -> i32 {
    finish_psend(resumed(kernel, None).map(Done::Later))
}

pub fn sys_preceive<A: Arch>(kernel: &Mutex<Kernel<A>>, fid: i32, message: Option<&mut i32>) -> i32 {
    let fid = match fid_from_abi(fid) {
        Ok(fid) => fid,
        Err(e) => return neg(e),
    };
    finish_preceive(call_blocking(kernel, |k| k.preceive(fid)), message)
}

/// 阻塞的 `sys_preceive` 在调用者重新运行后的返回值
pub fn sys_preceive_resume<A: Arch>(kernel: &Mutex<Kernel<A>>, message: Option<&mut i32>) -> i32 {
    finish_preceive(resumed(kernel, None).map(Done::Later), message)
}

pub fn sys_pcount<A: Arch>(kernel: &Mutex<Kernel<A>>, fid: i32, count: Option<&mut i32>) -> i32 {
    let result = fid_from_abi(fid).and_then(|fid| inspect(kernel, |k| k.pcount(fid)));
    match result {
        Ok(c) => {
            if let Some(out) = count {
                *out = c.legacy();
            }
            0
        }
        Err(e) => neg(e),
    }
}

pub fn sys_processes_status<A: Arch>(kernel: &Mutex<Kernel<A>>, out: &mut [ProcessStatus]) -> i32 {
    inspect(kernel, |k| k.processes_status(out)) as i32
}

pub fn sys_queues_status<A: Arch>(kernel: &Mutex<Kernel<A>>, out: &mut [QueueStatus]) -> i32 {
    inspect(kernel, |k| k.queues_status(out)) as i32
}
