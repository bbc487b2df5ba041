//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 消息队列表
//!
//! 固定大小的队列表，下标就是队列号 (fid)，容量为 0 表示槽位空闲。
//! 每个队列是一个整数环形缓冲区，外加两条按优先级排序的等待链表：
//! - `receivers`: 因队列为空而阻塞的接收者
//! - `senders`: 因队列已满而阻塞的发送者

use core::ptr::NonNull;

use crate::config::NBQUEUE;
use crate::errno::{KResult, KernelError};
use crate::list::TaskList;
use crate::mm::PoolBlock;

/// 队列号（队列表下标）
pub type Fid = usize;

pub struct MessageQueue {
    /// 缓冲区，空闲槽位为 None
    buf: Option<PoolBlock>,
    capacity: usize,
    front: usize,
    len: usize,
    pub(crate) receivers: TaskList,
    pub(crate) senders: TaskList,
}

impl MessageQueue {
    pub const FREE: MessageQueue = MessageQueue {
        buf: None,
        capacity: 0,
        front: 0,
        len: 0,
        receivers: TaskList::new(),
        senders: TaskList::new(),
    };

    #[inline]
    pub fn is_free(&self) -> bool {
        self.capacity == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// 启用槽位，缓冲区至少能放 `capacity` 个 i32
    pub(crate) fn open(&mut self, buf: PoolBlock, capacity: usize) {
        debug_assert!(buf.size() >= capacity * core::mem::size_of::<i32>());
        self.buf = Some(buf);
        self.capacity = capacity;
        self.front = 0;
        self.len = 0;
    }

    /// 关闭槽位，交回缓冲区
    pub(crate) fn close(&mut self) -> Option<PoolBlock> {
        debug_assert!(self.receivers.is_empty() && self.senders.is_empty());
        self.capacity = 0;
        self.front = 0;
        self.len = 0;
        self.buf.take()
    }

    /// 清空缓冲区
    pub(crate) fn clear(&mut self) {
        self.front = 0;
        self.len = 0;
    }

    fn slots(&self) -> Option<NonNull<i32>> {
        self.buf.and_then(|b| NonNull::new(b.as_ptr() as *mut i32))
    }

    /// 追加到队尾，满时返回 false
    pub(crate) fn push(&mut self, message: i32) -> bool {
        if self.is_full() {
            return false;
        }
        let Some(slots) = self.slots() else {
            return false;
        };
        let rear = (self.front + self.len) % self.capacity;
        // SAFETY: rear < capacity，缓冲区至少有 capacity 个 i32
        unsafe {
            slots.as_ptr().add(rear).write(message);
        }
        self.len += 1;
        true
    }

    /// 取出队首
    pub(crate) fn pop(&mut self) -> Option<i32> {
        if self.is_empty() {
            return None;
        }
        let slots = self.slots()?;
        // SAFETY: front < capacity，且该位置已经写入
        let message = unsafe { slots.as_ptr().add(self.front).read() };
        self.front = (self.front + 1) % self.capacity;
        self.len -= 1;
        Some(message)
    }
}

// 缓冲区来自内存池，只在持有内核锁时访问
unsafe impl Send for MessageQueue {}

/// 队列表
pub struct QueueTable {
    slots: [MessageQueue; NBQUEUE],
}

impl QueueTable {
    pub const fn new() -> Self {
        Self { slots: [MessageQueue::FREE; NBQUEUE] }
    }

    /// 查找正在使用的队列
    pub fn get(&self, fid: Fid) -> KResult<&MessageQueue> {
        match self.slots.get(fid) {
            Some(q) if !q.is_free() => Ok(q),
            _ => Err(KernelError::InvalidQueueId),
        }
    }

    /// 第一个空闲槽位
    pub fn find_free(&self) -> Option<Fid> {
        self.slots.iter().position(|q| q.is_free())
    }

    /// 正在使用的队列及其编号
    pub fn iter_used(&self) -> impl Iterator<Item = (Fid, &MessageQueue)> {
        self.slots.iter().enumerate().filter(|(_, q)| !q.is_free())
    }

    /// 不检查占用情况的访问，供等待链表维护使用
    pub(crate) fn slot_mut(&mut self, fid: Fid) -> &mut MessageQueue {
        &mut self.slots[fid]
    }
}

impl Default for QueueTable {
    fn default() -> Self {
        Self::new()
    }
}
