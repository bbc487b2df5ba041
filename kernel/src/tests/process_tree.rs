//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：进程创建、终止与父子回收
use super::*;
use crate::config::NBPROC;
use crate::errno::KernelError;
use crate::process::pid::PID_IDLE;
use crate::process::task::ProcState;
use crate::sched::{Block, Resumed};

const DUMMY_VAL: usize = 78;

#[test]
fn test_start_and_wait_return_value() {
    let (mut k, test) = boot_as(128);

    // 1. 高优先级子进程先运行完，父进程直接回收
    let child = k.start(ret_arg, 4000, 192, "paramRetour", DUMMY_VAL).unwrap();
    assert_eq!(k.getpid(), child);
    assert_eq!(run_to_exit(&mut k), child);
    assert_eq!(k.getpid(), test);
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, DUMMY_VAL as i32))));

    // 2. 低优先级子进程，父进程阻塞等待
    let child = k.start(ret_arg, 4000, 100, "paramRetour", DUMMY_VAL + 1).unwrap();
    assert_eq!(k.getpid(), test);
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Blocked));
    assert_eq!(k.getpid(), child);
    assert_eq!(k.task(test).unwrap().state(), ProcState::WaitingChild { target: Some(child) });

    run_to_exit(&mut k);
    assert_eq!(k.getpid(), test);
    assert_eq!(k.resume(), Some(Ok(Resumed::Reaped { pid: child, retval: DUMMY_VAL as i32 + 1 })));
    assert_eq!(k.task(child).err(), Some(KernelError::NoSuchProcess));
}

#[test]
fn test_kill_before_run_and_exit() {
    let (mut k, test) = boot_as(128);

    // 1. 杀死还没运行过的子进程，返回值为 0
    let child = k.start(ret_arg, 4000, 100, "procKill", 45).unwrap();
    assert_eq!(k.kill(child), Ok(()));
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, 0))));

    // 2. 子进程主动 exit
    let child = k.start(ret_arg, 4000, 192, "procExit", 45).unwrap();
    assert_eq!(k.getpid(), child);
    k.exit(45);
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, 45))));

    // 3. 不能等待自己
    assert_eq!(k.waitpid(Some(test)), Err(KernelError::NoSuchChild));
}

#[test]
fn test_invalid_targets() {
    let (mut k, test) = boot_as(128);

    assert_eq!(k.kill(PID_IDLE), Err(KernelError::InvalidPid));
    assert_eq!(k.kill(NBPROC), Err(KernelError::InvalidPid));
    assert_eq!(k.chprio(test, 0), Err(KernelError::InvalidPriority));
    assert_eq!(k.getprio(test), Ok(128));

    let child = k.start(ret_arg, 4000, 64, "norun", 0).unwrap();
    assert_eq!(k.kill(child), Ok(()));

    // 僵死进程不能再被杀死或修改优先级，但仍可查询
    assert_eq!(k.kill(child), Err(KernelError::AlreadyTerminated));
    assert_eq!(k.chprio(child, 128), Err(KernelError::AlreadyTerminated));
    assert_eq!(k.chprio(child, 64), Err(KernelError::AlreadyTerminated));
    assert_eq!(k.getprio(child), Ok(64));
    assert_eq!(k.getpname(child), Ok("norun"));

    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, 0))));
    assert_eq!(k.waitpid(Some(child)), Err(KernelError::NoSuchChild));
    assert_eq!(k.kill(child), Err(KernelError::NoSuchProcess));
    assert_eq!(k.getprio(child), Err(KernelError::NoSuchProcess));
}

#[test]
fn test_sibling_cannot_reap() {
    let (mut k, test) = boot_as(128);
    let victim = k.start(ret_arg, 4000, 64, "norun", 0).unwrap();
    let waiter = k.start(ret_arg, 4000, 65, "waiter", victim).unwrap();

    assert_eq!(k.waitpid(Some(waiter)), Ok(Block::Blocked));
    assert_eq!(k.getpid(), waiter);

    // 以下由 waiter 执行：杀死兄弟进程，但无权回收它
    assert_eq!(k.kill(victim), Ok(()));
    assert_eq!(k.getpid(), waiter);
    assert_eq!(k.waitpid(Some(victim)), Err(KernelError::NoSuchChild));
    k.exit(1);

    assert_eq!(k.getpid(), test);
    assert_eq!(k.resume(), Some(Ok(Resumed::Reaped { pid: waiter, retval: 1 })));
    assert_eq!(k.waitpid(Some(victim)), Ok(Block::Ready((victim, 0))));
}

#[test]
fn test_wait_any_child() {
    let (mut k, test) = boot_as(128);
    let p1 = k.start(ret_three, 0, 64, "proc6_1", 0).unwrap();
    let p2 = k.start(ret_arg, 4, 66, "proc6_2", 4).unwrap();
    assert_eq!(k.start(ret_arg, 0xffff_ffff, 65, "proc6_3", 5), Err(KernelError::StackTooLarge));
    let p3 = k.start(ret_arg, 8, 65, "proc6_3", 5).unwrap();

    // 子进程按优先级依次运行，父进程依次回收
    for (pid, retval) in [(p2, 4), (p3, 5), (p1, 3)] {
        assert_eq!(k.waitpid(None), Ok(Block::Blocked));
        assert_eq!(k.getpid(), pid);
        run_to_exit(&mut k);
        assert_eq!(k.getpid(), test);
        assert_eq!(k.resume(), Some(Ok(Resumed::Reaped { pid, retval })));
    }

    assert_eq!(k.waitpid(Some(p1)), Err(KernelError::NoSuchChild));
    assert_eq!(k.waitpid(None), Err(KernelError::NoSuchChild));
    assert_eq!(k.waitpid(Some(test)), Err(KernelError::NoSuchChild));
}

#[test]
fn test_wait_any_prefers_existing_zombie() {
    let (mut k, _) = boot_as(128);
    let running = k.start(ret_arg, 0, 64, "slow", 0).unwrap();
    let done = k.start(ret_arg, 0, 64, "fast", 0).unwrap();
    k.kill(done).unwrap();

    assert_eq!(k.waitpid(None), Ok(Block::Ready((done, 0))));
    assert!(k.task(running).is_ok());
}

#[test]
fn test_exit_orphans_children() {
    let (mut k, test) = boot_as(128);
    let zombie = k.start_background(ret_arg, 0, 64, "zombie", 0).unwrap();
    let orphan = k.start_background(ret_arg, 0, 64, "orphan", 0).unwrap();
    k.kill(zombie).unwrap();

    // 测试进程退出：僵死子进程被直接释放，存活子进程成为孤儿
    k.exit(0);
    assert_eq!(k.task(zombie).err(), Some(KernelError::NoSuchProcess));
    assert_eq!(k.task(orphan).unwrap().parent(), None);
    assert_eq!(k.getpid(), orphan);

    // 孤儿退出后不留下僵死进程
    k.exit(7);
    assert_eq!(k.task(orphan).err(), Some(KernelError::NoSuchProcess));
    assert_eq!(k.getpid(), PID_IDLE);

    assert_eq!(k.waitpid(Some(test)), Ok(Block::Ready((test, 0))));
    assert_eq!(k.free_slots(), NBPROC - 1);
}

#[test]
fn test_killing_waiting_parent() {
    let (mut k, test) = boot_as(128);
    let child = k.start(ret_arg, 0, 64, "child", 0).unwrap();
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Blocked));
    assert_eq!(k.getpid(), child);

    // 子进程杀死正在等待它的父进程
    assert_eq!(k.kill(test), Ok(()));
    assert_eq!(k.task(test).unwrap().state(), ProcState::Zombie { retval: 0 });
    assert_eq!(k.task(child).unwrap().parent(), None);

    k.exit(0);
    assert_eq!(k.getpid(), PID_IDLE);
    assert_eq!(k.waitpid(None), Ok(Block::Ready((test, 0))));
}

#[test]
fn test_process_table_exhaustion() {
    let (mut k, test) = boot_as(128);
    let fillers: Vec<_> =
        (2..NBPROC).map(|_| k.start_background(ret_arg, 0, 1, "filler", 0).unwrap()).collect();
    assert_eq!(k.free_slots(), 0);
    assert_eq!(k.start_background(ret_arg, 0, 1, "extra", 0), Err(KernelError::OutOfProcesses));

    // 父进程优先级最高，杀死子进程后仍由它回收
    let victim = fillers[0];
    k.kill(victim).unwrap();
    assert_eq!(k.getpid(), test);
    assert_eq!(k.waitpid(Some(victim)), Ok(Block::Ready((victim, 0))));
    assert_eq!(k.start_background(ret_arg, 0, 1, "extra", 0), Ok(victim));
}

#[test]
fn test_spawn_rejects_bad_arguments() {
    let mut k = boot();
    assert_eq!(k.start(ret_arg, 0, 0, "p", 0), Err(KernelError::InvalidPriority));
    assert_eq!(k.start(ret_arg, 0, 257, "p", 0), Err(KernelError::InvalidPriority));
    assert_eq!(k.start(ret_arg, 1 << 20, 10, "p", 0), Err(KernelError::StackTooLarge));
    assert_eq!(k.free_slots(), NBPROC - 1);

    let pid = k.start_background(ret_arg, 0, 10, "a-rather-long-process-name", 0).unwrap();
    assert_eq!(k.getpname(pid).unwrap().len(), crate::config::PROC_NAME_LEN - 1);
}

#[test]
fn test_idle_is_protected() {
    let mut k = boot();
    assert_eq!(k.chprio(PID_IDLE, 5), Err(KernelError::InvalidPid));
    k.exit(3);
    assert_eq!(k.getpid(), PID_IDLE);
    assert_eq!(k.task(PID_IDLE).unwrap().state(), ProcState::Running);
}

#[test]
#[should_panic(expected = "idle process cannot block")]
fn test_idle_cannot_sleep() {
    let mut k = boot();
    k.sleep_until(10);
}
