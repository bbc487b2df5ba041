//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 信号量 (Semaphore) 机制
//!
//! 建立在消息队列之上：容量为 `permits` 的队列预先放满令牌。
//! - P 操作 (down): 从队列接收一个令牌，没有令牌时阻塞
//! - V 操作 (up): 向队列发送一个令牌，唤醒优先级最高的等待者
//!
//! 等待者的顺序由队列等待链表决定，因此高优先级进程先获得信号量。

use log::warn;

use crate::arch::Arch;
use crate::errno::KResult;
use crate::ipc::queue::Fid;
use crate::sched::{Block, Kernel};

/// 队列中的令牌值
const TOKEN: i32 = 1;

/// 计数信号量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Semaphore {
    fid: Fid,
    permits: usize,
}

impl Semaphore {
    /// 创建新信号量，初始有 `permits` 个可用许可
    ///
    /// # 示例
    /// ```rust,ignore
    /// // 互斥信号量（二值信号量）
    /// let mutex = Semaphore::new(&mut kernel, 1)?;
    ///
    /// // 计数信号量（资源池）
    /// let pool = Semaphore::new(&mut kernel, 10)?;
    /// ```
    pub fn new<A: Arch>(kernel: &mut Kernel<A>, permits: i32) -> KResult<Self> {
        let fid = kernel.pcreate(permits)?;
        for _ in 0..permits {
            if let Err(e) = kernel.psend(fid, TOKEN) {
                let _ = kernel.pdelete(fid);
                return Err(e);
            }
        }
        Ok(Self { fid, permits: permits as usize })
    }

    /// 底层队列号
    #[inline]
    pub fn fid(&self) -> Fid {
        self.fid
    }

    /// 创建时的许可数
    #[inline]
    pub fn permits(&self) -> usize {
        self.permits
    }

    /// P 操作：获取一个许可，可能阻塞
    pub fn down<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<Block<()>> {
        kernel.preceive(self.fid).map(|b| b.map(|_| ()))
    }

    /// 非阻塞的 P 操作，没有可用许可时返回 false
    pub fn try_down<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<bool> {
        if self.available(kernel)? <= 0 {
            return Ok(false);
        }
        Ok(!self.down(kernel)?.is_blocked())
    }

    /// V 操作：释放一个许可
    ///
    /// 释放次数超过许可数时队列已满，调用者会阻塞直到有人取走许可。
    pub fn up<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<Block<()>> {
        kernel.psend(self.fid, TOKEN)
    }

    /// 可用许可数；为负时表示等待者个数
    pub fn available<A: Arch>(&self, kernel: &Kernel<A>) -> KResult<i32> {
        Ok(kernel.pcount(self.fid)?.legacy())
    }

    /// 销毁信号量，所有等待者以 `Interrupted` 失败
    pub fn destroy<A: Arch>(self, kernel: &mut Kernel<A>) -> KResult<()> {
        kernel.pdelete(self.fid)
    }
}

/// 互斥锁：一个许可的信号量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutex {
    sem: Semaphore,
}

impl Mutex {
    pub fn new<A: Arch>(kernel: &mut Kernel<A>) -> KResult<Self> {
        Ok(Self { sem: Semaphore::new(kernel, 1)? })
    }

    /// 加锁，锁被占用时阻塞
    pub fn lock<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<Block<()>> {
        self.sem.down(kernel)
    }

    pub fn try_lock<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<bool> {
        self.sem.try_down(kernel)
    }

    /// 解锁；未加锁时为空操作
    pub fn unlock<A: Arch>(&self, kernel: &mut Kernel<A>) -> KResult<()> {
        if self.sem.available(kernel)? >= 1 {
            warn!("sync: unlocking mutex on queue {} which is not locked", self.sem.fid());
            return Ok(());
        }
        self.sem.up(kernel).map(|_| ())
    }

    pub fn is_locked<A: Arch>(&self, kernel: &Kernel<A>) -> KResult<bool> {
        Ok(self.sem.available(kernel)? <= 0)
    }

    pub fn destroy<A: Arch>(self, kernel: &mut Kernel<A>) -> KResult<()> {
        self.sem.destroy(kernel)
    }
}
