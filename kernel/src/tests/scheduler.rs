//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：优先级调度、轮转与抢占
use super::*;
use crate::process::pid::PID_IDLE;
use crate::process::task::ProcState;
use crate::sched::Block;
use crate::sched::TICKS_PER_SCHED;

#[test]
fn test_runnable_order_by_priority() {
    let mut k = boot();
    let a = k.start_background(ret_arg, 0, 5, "a", 0).unwrap();
    let b = k.start_background(ret_arg, 0, 10, "b", 0).unwrap();
    let c = k.start_background(ret_arg, 0, 10, "c", 0).unwrap();
    let d = k.start_background(ret_arg, 0, 1, "d", 0).unwrap();

    // 后台创建不触发调度
    assert_eq!(k.getpid(), PID_IDLE);
    assert_eq!(runnable(&k), vec![b, c, a, d]);

    k.tick_scheduler();
    assert_eq!(k.getpid(), b);
    assert_eq!(k.task(b).unwrap().state(), ProcState::Running);
    assert_eq!(runnable(&k), vec![c, a, d, PID_IDLE]);
}

#[test]
fn test_round_robin_within_level() {
    let mut k = boot();
    let a = k.start(ret_arg, 0, 10, "a", 0).unwrap();
    let b = k.start_background(ret_arg, 0, 10, "b", 0).unwrap();
    let c = k.start_background(ret_arg, 0, 10, "c", 0).unwrap();
    assert_eq!(k.getpid(), a);

    let mut order = Vec::new();
    for _ in 0..4 {
        k.tick_scheduler();
        order.push(k.getpid());
    }
    assert_eq!(order, vec![b, c, a, b]);
}

#[test]
fn test_yielding_cycles_in_spawn_order() {
    let mut k = boot();
    let a = k.start_background(ret_arg, 0, 10, "a", 0).unwrap();
    let b = k.start_background(ret_arg, 0, 10, "b", 0).unwrap();
    let c = k.start_background(ret_arg, 0, 10, "c", 0).unwrap();
    k.tick_scheduler();

    // 每个进程睡眠 0 个时钟即让出 CPU
    let mut order = vec![k.getpid()];
    for _ in 0..5 {
        k.sleep_until(k.current_clock());
        order.push(k.getpid());
    }
    assert_eq!(order, vec![a, b, c, a, b, c]);
}

#[test]
fn test_lower_priority_never_preempts() {
    let mut k = boot();
    let hi = k.start(ret_arg, 0, 20, "hi", 0).unwrap();
    k.start(ret_arg, 0, 5, "lo", 0).unwrap();
    assert_eq!(k.getpid(), hi);

    for _ in 0..3 {
        k.tick_scheduler();
        assert_eq!(k.getpid(), hi);
    }
}

#[test]
fn test_timer_preempts_at_sched_boundary() {
    let mut k = boot();
    let a = k.start(ret_arg, 0, 10, "a", 0).unwrap();
    let b = k.start_background(ret_arg, 0, 10, "b", 0).unwrap();

    for _ in 1..TICKS_PER_SCHED {
        k.timer_interrupt();
        assert_eq!(k.getpid(), a);
    }
    k.timer_interrupt();
    assert_eq!(k.getpid(), b);
    assert_eq!(k.current_clock(), TICKS_PER_SCHED);
}

#[test]
fn test_spawn_preemption() {
    let mut k = boot();
    let a = k.start(ret_arg, 0, 10, "a", 0).unwrap();
    assert_eq!(k.getpid(), a);

    // 1. 更高优先级的前台创建立即抢占
    let b = k.start(ret_arg, 0, 20, "b", 0).unwrap();
    assert_eq!(k.getpid(), b);

    // 2. 后台创建等到下一次调度
    let c = k.start_background(ret_arg, 0, 30, "c", 0).unwrap();
    assert_eq!(k.getpid(), b);
    k.fix_scheduler();
    assert_eq!(k.getpid(), c);

    // 3. 同优先级的前台创建不抢占
    k.start(ret_arg, 0, 30, "d", 0).unwrap();
    assert_eq!(k.getpid(), c);
}

#[test]
fn test_chprio_reschedules() {
    let (mut k, test) = boot_as(128);
    assert_eq!(k.getprio(test), Ok(128));

    // 1. 子进程优先级更高，立即运行
    let child = k.start(ret_arg, 4000, 192, "prio", 192).unwrap();
    assert_eq!(k.getpid(), child);
    assert_eq!(k.getprio(child), Ok(192));

    // 2. 子进程降到 64，让出 CPU
    assert_eq!(k.chprio(child, 64), Ok(192));
    assert_eq!(k.getpid(), test);

    // 3. 测试进程降到 32，子进程重新运行并结束
    assert_eq!(k.chprio(test, 32), Ok(128));
    assert_eq!(k.getpid(), child);
    k.exit(0);
    assert_eq!(k.getpid(), test);

    assert_eq!(k.chprio(test, 128), Ok(32));
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, 0))));

    // 4. 让出 CPU 的子进程被杀死
    let child = k.start(ret_arg, 4000, 192, "prio", 192).unwrap();
    assert_eq!(k.chprio(child, 64), Ok(192));
    assert_eq!(k.getpid(), test);
    assert_eq!(k.kill(child), Ok(()));
    assert_eq!(k.waitpid(Some(child)), Ok(Block::Ready((child, 0))));
    assert_eq!(k.getpid(), test);
}

#[test]
fn test_chprio_moves_to_end_of_level() {
    let (mut k, _) = boot_as(128);
    let a = k.start_background(ret_arg, 0, 10, "a", 0).unwrap();
    let b = k.start_background(ret_arg, 0, 10, "b", 0).unwrap();
    let c = k.start_background(ret_arg, 0, 20, "c", 0).unwrap();
    assert_eq!(runnable(&k), vec![c, a, b, PID_IDLE]);

    // 优先级不变时位置不变
    assert_eq!(k.chprio(a, 10), Ok(10));
    assert_eq!(runnable(&k), vec![c, a, b, PID_IDLE]);

    assert_eq!(k.chprio(b, 20), Ok(10));
    assert_eq!(runnable(&k), vec![c, b, a, PID_IDLE]);
}

#[test]
fn test_switches_follow_decisions() {
    let mut k = boot();
    assert!(k.take_switch().is_none());

    let a = k.start(ret_arg, 0, 10, "a", 0).unwrap();
    assert_eq!(k.getpid(), a);
    assert!(k.take_switch().is_some());
    assert!(k.take_switch().is_none());
    assert_eq!(k.switch_count(), 1);
}
