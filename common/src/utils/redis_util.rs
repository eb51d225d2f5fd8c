use crate::error::AppError;
use deadpool_redis::{redis::cmd, Config, Pool, Runtime};

/// Redis 工具类 - 封装 deadpool-redis 连接池
#[derive(Clone)]
pub struct RedisUtil {
    pool: Pool,
}

impl RedisUtil {
    /// 从 URL 创建 Redis 连接池
    pub fn from_url(url: String) -> Result<Self, AppError> {
        log::info!("Initializing Redis connection pool");

        let cfg = Config::from_url(url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AppError::redis(format!("Failed to create Redis pool: {}", e)))?;

        log::info!("✅ Redis connection pool initialized successfully");

        Ok(RedisUtil { pool })
    }

    /// PING - 连通性检查（启动时调用）
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;

        let pong: String = cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::redis(format!("Redis PING error: {}", e)))?;

        if pong != "PONG" {
            return Err(AppError::redis(format!("Unexpected PING reply: {}", pong)));
        }
        Ok(())
    }

    /// GET - 获取值
    pub async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.pool.get().await?;

        let value: Option<String> = cmd("GET")
            .arg(&[key])
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::redis(format!("Redis GET error: {}", e)))?;

        Ok(value)
    }

    /// SETEX - 设置带过期时间的键值 (秒)
    pub async fn set_ex(&self, key: &str, value: &str, seconds: i64) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;

        cmd("SETEX")
            .arg(&[key, &seconds.to_string(), value])
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::redis(format!("Redis SETEX error: {}", e)))?;

        Ok(())
    }

    /// EXPIRE - 设置过期时间 (秒)，键不存在返回 false
    pub async fn expire(&self, key: &str, seconds: i64) -> Result<bool, AppError> {
        let mut conn = self.pool.get().await?;

        let set: i32 = cmd("EXPIRE")
            .arg(&[key, &seconds.to_string()])
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::redis(format!("Redis EXPIRE error: {}", e)))?;

        Ok(set > 0)
    }

    /// DEL - 删除键，返回是否删除了至少一个
    pub async fn del(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.pool.get().await?;

        let deleted: i32 = cmd("DEL")
            .arg(&[key])
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::redis(format!("Redis DEL error: {}", e)))?;

        Ok(deleted > 0)
    }
}
