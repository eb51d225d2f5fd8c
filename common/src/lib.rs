// 公共模块
// 提供配置、日志、错误处理、响应封装等通用功能

pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;

// 重新导出常用类型和函数
pub use config::{AppConfig, DbConfig};
pub use error::{AppError, AppResult};
pub use logger::{init_logger, init_logger_with_level};
pub use enums::{AccountChangeType, BetStatus, QuickFilter, UserRole};
