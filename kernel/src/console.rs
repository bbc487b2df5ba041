//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 控制台
//!
//! riscv64 上通过 SBI legacy console 输出；其他目标没有控制台，输出被丢弃。

/// 写入单个字符
#[cfg(target_arch = "riscv64")]
pub fn putchar(c: u8) {
    #[allow(deprecated)]
    sbi_rt::legacy::console_putchar(c as usize);
}

#[cfg(not(target_arch = "riscv64"))]
pub fn putchar(_c: u8) {}
