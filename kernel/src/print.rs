//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 控制台格式化输出：`print!` / `println!`

use core::fmt;
use crate::console;

pub struct Console;

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                console::putchar(b'\r');
            }
            console::putchar(b);
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ({
        let _ = ::core::fmt::Write::write_fmt(&mut $crate::print::Console, ::core::format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ({
        let mut _console = $crate::print::Console;
        let _ = ::core::fmt::Write::write_fmt(&mut _console, ::core::format_args!($($arg)*));
        let _ = ::core::fmt::Write::write_str(&mut _console, "\n");
    });
}
