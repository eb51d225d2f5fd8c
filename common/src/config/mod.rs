// 配置模块

pub mod app_config;
pub mod db_conf;

pub use app_config::{AppConfig, DatabaseConfig, LogConfig, RedisConfig, ServerConfig};
pub use db_conf::{init_rbatis, test_connection, DbConfig};
