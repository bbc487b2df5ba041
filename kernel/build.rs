//! Kestrel 内核构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml 配置文件（或 menuconfig 风格的 build/.config）
//! 2. 生成 src/config.rs 中的常量

use std::env;
use std::fs;
use std::path::PathBuf;
use std::collections::HashMap;

/// 解析 build/.config 文件（简单 section_key=value 格式）
fn parse_dot_config(content: &str) -> toml::Value {
    let mut sections: HashMap<String, HashMap<String, toml::Value>> = HashMap::new();

    for line in content.lines() {
        let line = line.trim();

        // 跳过注释和空行
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = &line[..eq_pos];
            let value = line[eq_pos + 1..].trim();

            // 分割 section_key（使用第一个下划线分割）
            if let Some(underscore_pos) = key.find('_') {
                let section = &key[..underscore_pos];
                let config_key = &key[underscore_pos + 1..];

                let parsed_value = if value == "true" {
                    toml::Value::Boolean(true)
                } else if value == "false" {
                    toml::Value::Boolean(false)
                } else if let Ok(int_val) = value.parse::<i64>() {
                    toml::Value::Integer(int_val)
                } else {
                    toml::Value::String(value.trim_matches('"').to_string())
                };

                sections.entry(section.to_string())
                    .or_insert_with(HashMap::new)
                    .insert(config_key.to_string(), parsed_value);
            }
        }
    }

    let mut root_map = toml::map::Map::new();
    for (section_name, section_data) in sections {
        let mut toml_map = toml::map::Map::new();
        for (k, v) in section_data {
            toml_map.insert(k, v);
        }
        root_map.insert(section_name, toml::Value::Table(toml_map));
    }

    toml::Value::Table(root_map)
}

/// 读取整数配置项，缺省时使用默认值
fn int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

/// 读取字符串配置项，缺省时使用默认值
fn string<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    println!("cargo:rerun-if-changed=../Kernel.toml");
    println!("cargo:rerun-if-changed=../build/.config");

    // 优先使用 build/.config，其次 Kernel.toml，都不存在时全部取默认值
    let config_content = if let Ok(content) = fs::read_to_string("../build/.config") {
        println!("cargo:warning=Using build/.config configuration");
        content
    } else if let Ok(content) = fs::read_to_string("../Kernel.toml") {
        content
    } else {
        println!("cargo:warning=Kernel.toml not found, using built-in defaults");
        String::new()
    };

    // 判断配置文件类型：检查是否有 TOML 的 [section] 格式
    let is_toml = config_content.lines().any(|line| {
        let trimmed = line.trim();
        trimmed.starts_with('[') && trimmed.ends_with(']')
    });

    let config = if is_toml {
        toml::from_str(&config_content)
            .expect("配置文件解析失败")
    } else {
        parse_dot_config(&config_content)
    };

    generate_config_code(&config);
}

fn generate_config_code(config: &toml::Value) {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let min_prio = int(config, "process", "min_prio", 1);
    let max_prio = int(config, "process", "max_prio", 256);
    assert!(min_prio >= 1 && min_prio <= max_prio, "process.min_prio/max_prio 配置非法");

    let clockfreq = int(config, "clock", "clockfreq", 200);
    let schedfreq = int(config, "clock", "schedfreq", 50);
    assert!(schedfreq > 0 && clockfreq % schedfreq == 0, "clock.clockfreq 必须是 schedfreq 的整数倍");

    let log_level = string(config, "debug", "log_level", "info");

    let config_header = format!(
        r#"//! Kestrel 内核配置（自动生成）
//!
//! 此文件由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

// ============================================================
// 基本信息
// ============================================================

/// 内核名称
pub const KERNEL_NAME: &str = "{}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{}";

// ============================================================
// 进程配置
// ============================================================

/// 进程表大小（含 0 号 idle 进程）
pub const NBPROC: usize = {};

/// 最低合法优先级
pub const MIN_PRIO: u32 = {};

/// 最高合法优先级
pub const MAX_PRIO: u32 = {};

/// idle 进程专用优先级
pub const IDLE_PRIO: u32 = 0;

/// 内核栈大小（字）
pub const KERNEL_STACK_WORDS: usize = {};

/// 用户栈上限（字节）
pub const MAX_USER_STACK: usize = {};

/// 进程名缓冲区长度（含结尾 NUL）
pub const PROC_NAME_LEN: usize = {};

// ============================================================
// 消息队列配置
// ============================================================

/// 消息队列表大小
pub const NBQUEUE: usize = {};

/// 单个队列容量上限
pub const MAX_QUEUE_CAPACITY: usize = {};

// ============================================================
// 时钟配置
// ============================================================

/// 时钟晶振频率 (Hz)
pub const QUARTZ: u64 = {};

/// 时钟中断频率 (Hz)
pub const CLOCKFREQ: u64 = {};

/// 调度频率 (Hz)
pub const SCHEDFREQ: u64 = {};

// ============================================================
// 内存配置
// ============================================================

/// 内存池大小（字节）
pub const POOL_SIZE: usize = {};

// ============================================================
// 调试配置
// ============================================================

/// 日志级别
pub const LOG_LEVEL: &str = "{}";
"#,
        string(config, "general", "name", "Kestrel"),
        string(config, "general", "version", "0.1.0"),
        int(config, "process", "nbproc", 30),
        min_prio,
        max_prio,
        int(config, "process", "kernel_stack_words", 1024),
        int(config, "process", "max_user_stack", 1 << 30),
        int(config, "process", "name_len", 20),
        int(config, "ipc", "nbqueue", 300),
        int(config, "ipc", "max_capacity", 1_000_000_000),
        int(config, "clock", "quartz", 0x1234DD),
        clockfreq,
        schedfreq,
        int(config, "memory", "pool_size", 4096) * 1024,
        log_level,
    );

    let config_file = manifest_dir.join("src").join("config.rs");

    // 只有内容变化时才写入，避免每次编译都更新文件时间戳
    let existing_content = fs::read_to_string(&config_file).unwrap_or_default();
    if existing_content != config_header {
        fs::write(&config_file, &config_header)
            .expect("写入配置文件失败");
    }
}
