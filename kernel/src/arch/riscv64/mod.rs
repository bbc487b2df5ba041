//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! RISC-V 64位架构支持
//!
//! - `Riscv64`: `Arch` 的裸机实现
//! - `KERNEL`: 全局内核实例，trap 层与系统调用都通过它进入调度器
//! - `start_kernel`: 启动入口，初始化进程表后成为 idle 进程

pub mod context;

use core::arch::asm;
use log::{error, info};

use crate::arch::{Arch, Entry};
use crate::config::{KERNEL_NAME, KERNEL_VERSION, POOL_SIZE};
use crate::process::task::CpuContext;
use crate::sched::Kernel;
use context::{cpu_switch_to, kernel_entry_trampoline, user_entry_trampoline, InterruptGuard};

/// init 进程优先级
const INIT_PRIO: u32 = 128;

/// 全局内核实例
pub static KERNEL: spin::Mutex<Kernel<Riscv64>> = spin::Mutex::new(Kernel::new());

/// 用户栈与队列缓冲区的内存池
static mut POOL: [u8; POOL_SIZE] = [0; POOL_SIZE];

pub struct Riscv64;

impl Arch for Riscv64 {
    type IrqGuard = InterruptGuard;

    #[inline]
    fn irq_save() -> InterruptGuard {
        // SAFETY: 只清除 sstatus.SIE，守卫析构时写回原值
        unsafe { InterruptGuard::new() }
    }

    fn prepare_kernel(ctx: &mut CpuContext, kstack_top: usize, entry: Entry, arg: usize) {
        *ctx = CpuContext::zeroed();
        ctx.ra = kernel_entry_trampoline as usize;
        ctx.sp = kstack_top;
        ctx.s[0] = entry as usize;
        ctx.s[1] = arg;
    }

    fn prepare_user(ctx: &mut CpuContext, kstack_top: usize, ustack_top: usize, entry: Entry, arg: usize) {
        *ctx = CpuContext::zeroed();
        ctx.ra = user_entry_trampoline as usize;
        ctx.sp = kstack_top;
        ctx.s[0] = entry as usize;
        ctx.s[1] = arg;
        ctx.s[2] = ustack_top;
    }

    unsafe fn switch(prev: *mut CpuContext, next: *const CpuContext) {
        // 中断已由调用者的守卫关闭；切回来之后守卫恢复的是 prev 自己的 sstatus
        cpu_switch_to(prev, next);
    }
}

/// 内核态进程入口函数返回后到达这里
extern "C" fn task_return(retval: i32) -> ! {
    crate::syscall::sys_exit(&KERNEL, retval);
    loop {
        unsafe { asm!("wfi", options(nomem, nostack)) };
    }
}

/// 时钟中断钩子，由 trap 层调用（此时 SIE 已被硬件清除）
pub fn timer_tick() {
    crate::syscall::on_timer_interrupt(&KERNEL);
}

/// 启动内核：初始化进程表，以后台方式创建 init，然后作为 idle 进程运行
pub fn start_kernel(init: Entry) -> ! {
    crate::logger::init();
    info!("{} {} starting", KERNEL_NAME, KERNEL_VERSION);

    // SAFETY: 启动时只取一次，之后由内存池独占
    let pool: &'static mut [u8] = unsafe { &mut *core::ptr::addr_of_mut!(POOL) };
    {
        let _irq = Riscv64::irq_save();
        let mut kernel = KERNEL.lock();
        kernel.setup(pool);
        if let Err(e) = kernel.start_background(init, 0, INIT_PRIO, "init", 0) {
            error!("failed to start init: {}", e);
        }
    }

    idle()
}

/// idle 进程：开中断等待，被时钟中断抢占
pub fn idle() -> ! {
    loop {
        unsafe {
            asm!("csrsi sstatus, 0x2", options(nomem, nostack));
            asm!("wfi", options(nomem, nostack));
            asm!("csrci sstatus, 0x2", options(nomem, nostack));
        }
    }
}
