//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 时钟
//!
//! 定时器中断以 CLOCKFREQ Hz 到来，每 CLOCKFREQ / SCHEDFREQ 次中断
//! 执行一次完整的调度。睡眠时刻都以中断计数为单位。

use crate::arch::Arch;
use crate::config::{CLOCKFREQ, QUARTZ, SCHEDFREQ};
use super::sched::Kernel;

/// 每次调度之间的时钟中断数
pub const TICKS_PER_SCHED: u64 = CLOCKFREQ / SCHEDFREQ;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    ticks: u64,
}

impl Clock {
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.ticks
    }

    /// 前进一个中断，返回是否到达调度点
    pub fn advance(&mut self) -> bool {
        self.ticks += 1;
        self.ticks % TICKS_PER_SCHED == 0
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// 时钟参数：(晶振频率, 中断频率)
pub const fn clock_settings() -> (u64, u64) {
    (QUARTZ, CLOCKFREQ)
}

impl<A: Arch> Kernel<A> {
    /// 定时器中断处理
    pub fn timer_interrupt(&mut self) {
        if self.clock.advance() {
            self.tick_scheduler();
        }
    }

    /// 自启动以来的时钟中断数
    #[inline]
    pub fn current_clock(&self) -> u64 {
        self.clock.now()
    }
}
