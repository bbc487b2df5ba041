//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

// 测试：信号量与互斥锁
use super::*;
use crate::errno::KernelError;
use crate::sched::{Block, Resumed};
use crate::sync::{Mutex, Semaphore};

#[test]
fn test_counting_semaphore() {
    let (mut k, test) = boot_as(5);
    let sem = Semaphore::new(&mut k, 2).unwrap();
    assert_eq!(sem.permits(), 2);
    assert_eq!(sem.available(&k), Ok(2));

    assert_eq!(sem.down(&mut k), Ok(Block::Ready(())));
    assert_eq!(sem.down(&mut k), Ok(Block::Ready(())));
    assert_eq!(sem.try_down(&mut k), Ok(false));
    assert_eq!(sem.available(&k), Ok(0));

    // 1. 没有许可时阻塞
    let worker = k.start(ret_arg, 0, 10, "worker", 0).unwrap();
    assert_eq!(sem.down(&mut k), Ok(Block::Blocked));
    assert_eq!(k.getpid(), test);
    assert_eq!(sem.available(&k), Ok(-1));

    // 2. 释放的许可直接交给等待者
    assert_eq!(sem.up(&mut k), Ok(Block::Ready(())));
    assert_eq!(k.getpid(), worker);
    assert!(matches!(k.resume(), Some(Ok(Resumed::Received(_)))));
    assert_eq!(sem.available(&k), Ok(0));

    sem.up(&mut k).unwrap();
    k.exit(0);
    assert_eq!(k.getpid(), test);
    assert_eq!(sem.available(&k), Ok(1));
    assert_eq!(sem.try_down(&mut k), Ok(true));
}

#[test]
fn test_mutex_lock_unlock() {
    let mut k = boot();
    let mutex = Mutex::new(&mut k).unwrap();
    assert_eq!(mutex.is_locked(&k), Ok(false));

    assert_eq!(mutex.lock(&mut k), Ok(Block::Ready(())));
    assert_eq!(mutex.is_locked(&k), Ok(true));
    assert_eq!(mutex.try_lock(&mut k), Ok(false));

    assert_eq!(mutex.unlock(&mut k), Ok(()));
    assert_eq!(mutex.is_locked(&k), Ok(false));

    // 重复解锁不会多出许可
    assert_eq!(mutex.unlock(&mut k), Ok(()));
    assert_eq!(mutex.try_lock(&mut k), Ok(true));
    assert_eq!(mutex.try_lock(&mut k), Ok(false));
}

#[test]
fn test_destroy_interrupts_waiters() {
    let (mut k, test) = boot_as(5);
    let mutex = Mutex::new(&mut k).unwrap();
    mutex.lock(&mut k).unwrap();

    let waiter = k.start(ret_arg, 0, 10, "waiter", 0).unwrap();
    assert_eq!(mutex.lock(&mut k), Ok(Block::Blocked));
    assert_eq!(k.getpid(), test);

    mutex.destroy(&mut k).unwrap();
    assert_eq!(k.getpid(), waiter);
    assert_eq!(k.resume(), Some(Err(KernelError::Interrupted)));
    assert_eq!(mutex.lock(&mut k), Err(KernelError::InvalidQueueId));
}

#[test]
fn test_semaphore_creation_errors() {
    let mut k = boot();
    assert_eq!(Semaphore::new(&mut k, 0), Err(KernelError::InvalidCapacity));
    assert_eq!(k.queues_status(&mut []), 0);
}
