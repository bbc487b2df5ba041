//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 模拟后端
//!
//! 在非 riscv64 目标上代替真实的上下文切换：
//! `prepare_*` 把入口、参数和栈顶记在上下文里，`switch` 只计数并立即返回。
//! 调度结果完全由调度器状态体现，测试通过 `Kernel::resume` 取回阻塞调用的结果。
//!
//! 中断开关用一个嵌套计数模拟，`switch` 检查调用者确实关了中断。

use core::sync::atomic::{AtomicUsize, Ordering};

use super::{Arch, Entry};
use crate::process::task::CpuContext;

/// `ra` 中的模式标记
const MODE_KERNEL: usize = 1;
const MODE_USER: usize = 2;

static SWITCHES: AtomicUsize = AtomicUsize::new(0);

/// 关中断嵌套深度
#[cfg(not(test))]
mod irq {
    use core::sync::atomic::{AtomicUsize, Ordering};

    static DEPTH: AtomicUsize = AtomicUsize::new(0);

    pub fn depth() -> usize {
        DEPTH.load(Ordering::Relaxed)
    }

    pub fn set(depth: usize) {
        DEPTH.store(depth, Ordering::Relaxed);
    }
}


/// 模拟的关中断守卫
pub struct SimIrqGuard {
    _private: (),
}

impl Drop for SimIrqGuard {
    fn drop(&mut self) {
        irq::set(irq::depth() - 1);
    }
}

pub struct Sim;

impl Sim {
    /// 读出 `prepare_*` 记录的入口与参数
    pub fn entry_of(ctx: &CpuContext) -> Option<(Entry, usize)> {
        if ctx.ra != MODE_KERNEL && ctx.ra != MODE_USER {
            return None;
        }
        // SAFETY: s0 只由 prepare_* 写入，内容来自一个 Entry
        let entry = unsafe { core::mem::transmute::<usize, Entry>(ctx.s[0]) };
        Some((entry, ctx.s[1]))
    }

    /// 上下文是否为用户态进程准备
    pub fn is_user(ctx: &CpuContext) -> bool {
        ctx.ra == MODE_USER
    }

    /// 当前是否处于某个 `irq_save` 守卫之内
    pub fn irqs_disabled() -> bool {
        irq::depth() > 0
    }

    /// 累计切换次数（所有内核实例共享）
    pub fn switch_count() -> usize {
        SWITCHES.load(Ordering::Relaxed)
    }
}

impl Arch for Sim {
    type IrqGuard = SimIrqGuard;

    fn irq_save() -> SimIrqGuard {
        irq::set(irq::depth() + 1);
        SimIrqGuard { _private: () }
    }

    fn prepare_kernel(ctx: &mut CpuContext, kstack_top: usize, entry: Entry, arg: usize) {
        *ctx = CpuContext::zeroed();
        ctx.ra = MODE_KERNEL;
        ctx.sp = kstack_top;
        ctx.s[0] = entry as usize;
        ctx.s[1] = arg;
    }

    fn prepare_user(ctx: &mut CpuContext, kstack_top: usize, ustack_top: usize, entry: Entry, arg: usize) {
        *ctx = CpuContext::zeroed();
        ctx.ra = MODE_USER;
        ctx.sp = kstack_top;
        ctx.s[0] = entry as usize;
        ctx.s[1] = arg;
        ctx.s[2] = ustack_top;
    }

    unsafe fn switch(_prev: *mut CpuContext, _next: *const CpuContext) {
        assert!(Self::irqs_disabled(), "context switch with interrupts enabled");
        SWITCHES.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn body(arg: usize) -> i32 {
        arg as i32 * 2
    }

    #[test]
    fn test_prepare_records_entry() {
        let mut ctx = CpuContext::zeroed();
        Sim::prepare_kernel(&mut ctx, 0x1000, body, 21);
        let (entry, arg) = Sim::entry_of(&ctx).unwrap();
        assert_eq!(entry(arg), 42);
        assert_eq!(ctx.sp, 0x1000);
        assert!(!Sim::is_user(&ctx));

        Sim::prepare_user(&mut ctx, 0x1000, 0x8000, body, 1);
        assert!(Sim::is_user(&ctx));
        assert_eq!(ctx.s[2], 0x8000);
    }

    #[test]
    fn test_irq_guards_nest() {
        assert!(!Sim::irqs_disabled());
        {
            let _outer = Sim::irq_save();
            {
                let _inner = Sim::irq_save();
                assert!(Sim::irqs_disabled());
            }
            assert!(Sim::irqs_disabled());
        }
        assert!(!Sim::irqs_disabled());
    }

    #[test]
    #[should_panic(expected = "context switch with interrupts enabled")]
    fn test_switch_requires_irqs_off() {
        let mut prev = CpuContext::zeroed();
        let next = CpuContext::zeroed();
        unsafe { Sim::switch(&mut prev, &next) };
    }

    #[test]
    fn test_blank_context_has_no_entry() {
        assert!(Sim::entry_of(&CpuContext::zeroed()).is_none());
    }
}
