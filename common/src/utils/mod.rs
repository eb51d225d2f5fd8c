pub mod invite_code;
pub mod money_util;
pub mod redis_util;

pub use redis_util::RedisUtil;
