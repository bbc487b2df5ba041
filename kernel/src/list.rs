//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 进程链表
//!
//! 侵入式单向链表：节点就是进程表槽位，后继下标保存在进程状态里
//! （见 `ProcState::link`）。链表本身只记录表头。
//!
//! 用途：
//! - 就绪链表：按优先级降序，同优先级先进先出
//! - 睡眠链表：按唤醒时刻升序，同时刻先进先出
//! - 空闲链表：栈式，后释放的槽位先被复用
//! - 队列等待链表：与就绪链表相同的排序规则
//!
//! 节点入链前必须已经处于带 `next` 的状态，否则视为内部错误直接 panic。

use crate::process::pid::Pid;
use crate::process::task::{Link, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskList {
    head: Link,
}

fn next_of(tasks: &[Task], pid: Pid) -> Link {
    match tasks[pid].state.link() {
        Some(next) => next,
        None => panic!("task {} is not on any list ({:?})", pid, tasks[pid].state),
    }
}

fn set_next(tasks: &mut [Task], pid: Pid, next: Link) {
    let state = tasks[pid].state;
    match tasks[pid].state.link_mut() {
        Some(link) => *link = next,
        None => panic!("task {} cannot be linked ({:?})", pid, state),
    }
}

impl TaskList {
    /// 创建空链表
    pub const fn new() -> Self {
        Self { head: None }
    }

    #[inline]
    pub fn head(&self) -> Option<Pid> {
        self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// 头插
    pub fn push_front(&mut self, tasks: &mut [Task], pid: Pid) {
        set_next(tasks, pid, self.head);
        self.head = Some(pid);
    }

    /// 插在第一个满足 `before(新节点, 该节点)` 的节点之前，没有则插在末尾
    pub fn insert_before<F>(&mut self, tasks: &mut [Task], pid: Pid, before: F)
    where
        F: Fn(&Task, &Task) -> bool,
    {
        let mut prev: Link = None;
        let mut cur = self.head;
        while let Some(node) = cur {
            if before(&tasks[pid], &tasks[node]) {
                break;
            }
            prev = Some(node);
            cur = next_of(tasks, node);
        }

        set_next(tasks, pid, cur);
        match prev {
            None => self.head = Some(pid),
            Some(p) => set_next(tasks, p, Some(pid)),
        }
    }

    /// 按优先级降序插入，同优先级排在已有节点之后
    pub fn insert_by_prio(&mut self, tasks: &mut [Task], pid: Pid) {
        self.insert_before(tasks, pid, |new, node| new.prio > node.prio);
    }

    /// 摘下表头
    pub fn pop_front(&mut self, tasks: &mut [Task]) -> Option<Pid> {
        let head = self.head?;
        self.head = next_of(tasks, head);
        set_next(tasks, head, None);
        Some(head)
    }

    /// 从链表中摘除 `pid`，返回它是否在链表上
    pub fn remove(&mut self, tasks: &mut [Task], pid: Pid) -> bool {
        let mut prev: Link = None;
        let mut cur = self.head;
        while let Some(node) = cur {
            let next = next_of(tasks, node);
            if node == pid {
                match prev {
                    None => self.head = next,
                    Some(p) => set_next(tasks, p, next),
                }
                set_next(tasks, pid, None);
                return true;
            }
            prev = Some(node);
            cur = next;
        }
        false
    }

    /// 优先级改变后重新定位
    pub fn reposition(&mut self, tasks: &mut [Task], pid: Pid) {
        if self.remove(tasks, pid) {
            self.insert_by_prio(tasks, pid);
        }
    }

    pub fn iter<'a>(&self, tasks: &'a [Task]) -> Iter<'a> {
        Iter { tasks, cur: self.head }
    }

    pub fn len(&self, tasks: &[Task]) -> usize {
        self.iter(tasks).count()
    }
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}

/// 链表迭代器，按链表顺序给出 pid
pub struct Iter<'a> {
    tasks: &'a [Task],
    cur: Link,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Pid;

    fn next(&mut self) -> Option<Pid> {
        let pid = self.cur?;
        self.cur = next_of(self.tasks, pid);
        Some(pid)
    }
}
