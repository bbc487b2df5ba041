//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! `log` 后端
//!
//! 把日志记录格式化后经 `println!` 输出到控制台，级别由 Kernel.toml 的
//! `debug.log_level` 决定。裸机启动路径负责调用 `init`。

use log::{LevelFilter, Log, Metadata, Record};

use crate::config::LOG_LEVEL;

struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::println!("[{:>5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// 配置的日志级别，无法识别时为 Info；`debug_log` 特性打开全部 trace 日志
pub fn configured_level() -> LevelFilter {
    if cfg!(feature = "debug_log") {
        return LevelFilter::Trace;
    }
    LOG_LEVEL.parse().unwrap_or(LevelFilter::Info)
}

/// 安装日志后端；重复调用只会更新级别
pub fn init() {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(configured_level());
}
