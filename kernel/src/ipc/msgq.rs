//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 消息队列操作
//!
//! 发送与接收都可能阻塞：
//! - 队列满时发送者带着消息挂到 `senders` 上，直到有接收者腾出空间
//! - 队列空时接收者挂到 `receivers` 上；此后的第一条消息绕过缓冲区直接交给它
//!
//! 两条等待链表都按优先级排序，唤醒总是优先给最高优先级的等待者。
//! 删除或重置队列会以 `Wakeup::Aborted` 唤醒所有等待者。

use log::{debug, trace, warn};

use crate::arch::Arch;
use crate::config::MAX_QUEUE_CAPACITY;
use crate::errno::{KResult, KernelError};
use crate::process::task::{ProcState, Wakeup};
use crate::sched::{Block, Kernel};
use super::queue::Fid;

/// 队列占用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueCount {
    /// 缓冲区中的消息数
    pub buffered: usize,
    /// 因队列满而阻塞的发送者
    pub blocked_senders: usize,
    /// 因队列空而阻塞的接收者
    pub blocked_receivers: usize,
}

impl QueueCount {
    /// 带符号的 pcount 值
    ///
    /// 队列为空时为等待接收者数的相反数，否则为缓冲消息数加等待发送者数。
    pub fn legacy(&self) -> i32 {
        if self.buffered == 0 {
            -(self.blocked_receivers as i32)
        } else {
            (self.buffered + self.blocked_senders) as i32
        }
    }
}

impl<A: Arch> Kernel<A> {
    /// 创建容量为 `capacity` 的队列
    pub fn pcreate(&mut self, capacity: i32) -> KResult<Fid> {
        if capacity <= 0 {
            return Err(KernelError::InvalidCapacity);
        }
        let capacity = capacity as usize;
        if capacity > MAX_QUEUE_CAPACITY {
            return Err(KernelError::CapacityTooLarge);
        }
        let fid = self.queues.find_free().ok_or(KernelError::OutOfQueues)?;
        let bytes = capacity.checked_mul(core::mem::size_of::<i32>())
            .ok_or(KernelError::OutOfMemory)?;
        let buf = self.pool.alloc(bytes, core::mem::align_of::<i32>())?;
        self.queues.slot_mut(fid).open(buf, capacity);
        debug!("ipc: queue {} created, capacity {}", fid, capacity);
        Ok(fid)
    }

    /// 删除队列，所有等待者以失败唤醒
    pub fn pdelete(&mut self, fid: Fid) -> KResult<()> {
        self.queues.get(fid)?;
        let aborted = self.abort_waiters(fid);
        if let Some(buf) = self.queues.slot_mut(fid).close() {
            self.pool.free(buf);
        }
        if aborted > 0 {
            warn!("ipc: queue {} deleted with {} waiter(s)", fid, aborted);
        } else {
            debug!("ipc: queue {} deleted", fid);
        }
        self.fix_scheduler();
        Ok(())
    }

    /// 清空队列，所有等待者以失败唤醒，队列保留
    pub fn preset(&mut self, fid: Fid) -> KResult<()> {
        self.queues.get(fid)?;
        let aborted = self.abort_waiters(fid);
        self.queues.slot_mut(fid).clear();
        debug!("ipc: queue {} reset, {} waiter(s) aborted", fid, aborted);
        self.fix_scheduler();
        Ok(())
    }

    fn abort_waiters(&mut self, fid: Fid) -> usize {
        let mut aborted = 0;
        while let Some(pid) = self.queues.slot_mut(fid).receivers.pop_front(&mut self.tasks) {
            self.wake(pid, Some(Wakeup::Aborted));
            aborted += 1;
        }
        while let Some(pid) = self.queues.slot_mut(fid).senders.pop_front(&mut self.tasks) {
            self.wake(pid, Some(Wakeup::Aborted));
            aborted += 1;
        }
        aborted
    }

    /// 发送消息
    ///
    /// 队列满时阻塞；队列空且有接收者在等时直接交给优先级最高的接收者。
    pub fn psend(&mut self, fid: Fid, message: i32) -> KResult<Block<()>> {
        let (full, empty) = {
            let queue = self.queues.get(fid)?;
            (queue.is_full(), queue.is_empty())
        };

        if full {
            let pid = self.block_current(ProcState::WaitingQueueFull { fid, message, next: None });
            self.queues.slot_mut(fid).senders.insert_by_prio(&mut self.tasks, pid);
            trace!("ipc: pid {} blocked sending to full queue {}", pid, fid);
            self.tick_scheduler();
            return Ok(Block::Blocked);
        }

        if empty {
            if let Some(receiver) = self.queues.slot_mut(fid).receivers.pop_front(&mut self.tasks) {
                trace!("ipc: queue {} hands {} to pid {}", fid, message, receiver);
                self.wake(receiver, Some(Wakeup::Message(message)));
                self.fix_scheduler();
                return Ok(Block::Ready(()));
            }
        }

        self.queues.slot_mut(fid).push(message);
        Ok(Block::Ready(()))
    }

    /// 接收消息
    ///
    /// 队列空时阻塞；取走一条消息后若有发送者在等，把它的消息补进队尾并唤醒它。
    pub fn preceive(&mut self, fid: Fid) -> KResult<Block<i32>> {
        if self.queues.get(fid)?.is_empty() {
            let pid = self.block_current(ProcState::WaitingQueueEmpty { fid, next: None });
            self.queues.slot_mut(fid).receivers.insert_by_prio(&mut self.tasks, pid);
            trace!("ipc: pid {} blocked receiving from empty queue {}", pid, fid);
            self.tick_scheduler();
            return Ok(Block::Blocked);
        }

        let queue = self.queues.slot_mut(fid);
        let Some(message) = queue.pop() else {
            return Err(KernelError::InvalidQueueId);
        };

        if let Some(sender) = queue.senders.pop_front(&mut self.tasks) {
            let ProcState::WaitingQueueFull { message: pending, .. } = self.tasks[sender].state else {
                panic!("pid {} on send list of queue {} is not sending", sender, fid);
            };
            queue.push(pending);
            trace!("ipc: pid {} unblocked on queue {}", sender, fid);
            self.wake(sender, Some(Wakeup::Sent));
            self.fix_scheduler();
        }
        Ok(Block::Ready(message))
    }

    /// 队列占用情况
    pub fn pcount(&self, fid: Fid) -> KResult<QueueCount> {
        let queue = self.queues.get(fid)?;
        Ok(QueueCount {
            buffered: queue.len(),
            blocked_senders: queue.senders.len(&self.tasks),
            blocked_receivers: queue.receivers.len(&self.tasks),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_count_sign() {
        let starving = QueueCount { buffered: 0, blocked_senders: 0, blocked_receivers: 3 };
        assert_eq!(starving.legacy(), -3);

        let backed_up = QueueCount { buffered: 4, blocked_senders: 2, blocked_receivers: 0 };
        assert_eq!(backed_up.legacy(), 6);

        assert_eq!(QueueCount::default().legacy(), 0);
    }
}
