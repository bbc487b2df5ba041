//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! RISC-V 64-bit 上下文切换
//!
//! 对应 Linux 的 cpu_switch_to (arch/riscv/kernel/entry.S)：
//! - 只保存被调用者保存寄存器 ra, sp, s0-s11，其余寄存器由调用约定保证
//! - 新进程的上下文由 prepare_* 构造，首次切入时 `ret` 到入口跳板
//!
//! 跳板约定：
//! - s0 = 入口函数
//! - s1 = 入口参数
//! - s2 = 用户栈栈顶（仅用户态进程）

use core::arch::asm;

use crate::process::task::CpuContext;

/// exit 系统调用号（用户态进程入口函数返回后使用）
pub const SYS_EXIT: usize = 62;

/// 中断保护 RAII 守卫
///
/// 在作用域内禁用中断，离开时恢复 sstatus
///
/// 对应 Linux 的 local_irq_save()/local_irq_restore()
pub struct InterruptGuard {
    flags: usize,
}

impl InterruptGuard {
    /// 清除 sstatus.SIE 并记住原值
    #[inline]
    pub unsafe fn new() -> Self {
        let flags: usize;
        asm!("csrrci {}, sstatus, 0x2", out(reg) flags, options(nomem, nostack));
        InterruptGuard { flags }
    }
}

impl Drop for InterruptGuard {
    #[inline]
    fn drop(&mut self) {
        unsafe {
            asm!("csrw sstatus, {}", in(reg) self.flags, options(nomem, nostack));
        }
    }
}

/// 上下文切换
///
/// # Safety
///
/// - `prev` 和 `next` 指向有效的 `CpuContext`，布局为 ra, sp, s0-s11
/// - 必须在 S 模式调用，调用者已禁用中断
#[unsafe(naked)]
#[no_mangle]
#[link_section = ".text.context_switch"]
pub unsafe extern "C" fn cpu_switch_to(prev: *mut CpuContext, next: *const CpuContext) {
    // a0 = prev (保存到这里), a1 = next (从这里恢复)
    core::arch::naked_asm!(
        "sd ra, 0(a0)",
        "sd sp, 8(a0)",
        "sd s0, 16(a0)",
        "sd s1, 24(a0)",
        "sd s2, 32(a0)",
        "sd s3, 40(a0)",
        "sd s4, 48(a0)",
        "sd s5, 56(a0)",
        "sd s6, 64(a0)",
        "sd s7, 72(a0)",
        "sd s8, 80(a0)",
        "sd s9, 88(a0)",
        "sd s10, 96(a0)",
        "sd s11, 104(a0)",

        "ld ra, 0(a1)",
        "ld sp, 8(a1)",
        "ld s0, 16(a1)",
        "ld s1, 24(a1)",
        "ld s2, 32(a1)",
        "ld s3, 40(a1)",
        "ld s4, 48(a1)",
        "ld s5, 56(a1)",
        "ld s6, 64(a1)",
        "ld s7, 72(a1)",
        "ld s8, 80(a1)",
        "ld s9, 88(a1)",
        "ld s10, 96(a1)",
        "ld s11, 104(a1)",

        "ret",
    );
}

/// 内核态进程入口跳板
///
/// 打开中断，调用 entry(arg)，返回值交给 task_return 走 exit 路径
#[unsafe(naked)]
pub unsafe extern "C" fn kernel_entry_trampoline() -> ! {
    core::arch::naked_asm!(
        "csrsi sstatus, 0x2",
        "mv a0, s1",
        "jalr s0",
        "tail {exit}",
        exit = sym super::task_return,
    );
}

/// 用户态进程入口跳板
///
/// sepc = entry，SPP = U，SPIE = 1，sscratch 保存内核栈顶，
/// 用户代码返回时落到 user_exit_stub 发起 exit 系统调用
#[unsafe(naked)]
pub unsafe extern "C" fn user_entry_trampoline() -> ! {
    core::arch::naked_asm!(
        "csrw sepc, s0",
        "li t0, 0x100",
        "csrc sstatus, t0",
        "li t0, 0x20",
        "csrs sstatus, t0",
        "csrw sscratch, sp",
        "mv sp, s2",
        "mv a0, s1",
        "la ra, {stub}",
        "sret",
        stub = sym user_exit_stub,
    );
}

/// 用户态入口函数返回后执行：a0 中是返回值
#[unsafe(naked)]
#[link_section = ".text.user"]
pub unsafe extern "C" fn user_exit_stub() -> ! {
    core::arch::naked_asm!(
        "1:",
        "li a7, {nr}",
        "ecall",
        "j 1b",
        nr = const SYS_EXIT,
    );
}
