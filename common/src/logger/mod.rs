// 日志模块
use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// 初始化日志系统
///
/// 日志级别取自 RUST_LOG 环境变量, 默认 info
pub fn init_logger() {
    init_logger_with_level(level_from_env());
}

/// 初始化日志系统（带自定义级别）
pub fn init_logger_with_level(level: LevelFilter) {
    let mut builder = Builder::new();

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(level)
        .init();

    log::info!("✅ 日志系统初始化完成 (级别: {:?})", level);
}

fn level_from_env() -> LevelFilter {
    match std::env::var("RUST_LOG") {
        Ok(level) => parse_level(&level).unwrap_or(LevelFilter::Info),
        Err(_) => LevelFilter::Info,
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("whatever"), None);
    }
}
