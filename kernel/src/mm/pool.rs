//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 内存池
//!
//! 启动时交给内核的一整块固定内存，用 `linked_list_allocator::Heap`
//! 做首次适配分配。用户栈和消息队列缓冲区都从这里分配，
//! 进程表和队列表本身是静态数组，不经过内存池。

use core::alloc::Layout;
use core::ptr::NonNull;
use linked_list_allocator::Heap;
use log::warn;

use crate::errno::{KResult, KernelError};

/// 从内存池分配出的一块内存，释放时必须原样交回
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl PoolBlock {
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// 块末尾地址（不含）
    #[inline]
    pub fn end(&self) -> usize {
        self.ptr.as_ptr() as usize + self.layout.size()
    }
}

pub struct MemPool {
    heap: Heap,
}

impl MemPool {
    pub const fn new() -> Self {
        Self { heap: Heap::empty() }
    }

    /// 用一块静态内存初始化内存池
    ///
    /// 区域太小时保持为空池，之后所有分配都会失败。
    pub fn init(&mut self, region: &'static mut [u8]) {
        if region.len() < 4 * core::mem::size_of::<usize>() {
            warn!("mm: pool region too small ({} bytes), pool disabled", region.len());
            return;
        }
        // SAFETY: region 是 'static 的独占借用，此后只由本内存池管理
        unsafe {
            self.heap.init(region.as_mut_ptr(), region.len());
        }
    }

    /// 分配 `size` 字节，按 `align` 对齐
    pub fn alloc(&mut self, size: usize, align: usize) -> KResult<PoolBlock> {
        let size = size.max(core::mem::size_of::<usize>());
        let layout = Layout::from_size_align(size, align)
            .map_err(|_| KernelError::OutOfMemory)?;
        let ptr = self.heap.allocate_first_fit(layout)
            .map_err(|_| KernelError::OutOfMemory)?;
        Ok(PoolBlock { ptr, layout })
    }

    /// 归还一块内存
    pub fn free(&mut self, block: PoolBlock) {
        // SAFETY: block 只能由 alloc 创建，且所有权在此处交回
        unsafe {
            self.heap.deallocate(block.ptr, block.layout);
        }
    }

    /// 剩余字节数
    pub fn free_bytes(&self) -> usize {
        self.heap.free()
    }

    /// 总字节数
    pub fn size(&self) -> usize {
        self.heap.size()
    }
}

impl Default for MemPool {
    fn default() -> Self {
        Self::new()
    }
}
