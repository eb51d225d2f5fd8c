// 错误处理模块
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::response::R;

/// 余额不足的业务错误码, 与普通参数错误(400)区分
pub const CODE_INSUFFICIENT_FUNDS: u16 = 4001;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(String),

    #[error("Redis错误: {0}")]
    Redis(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("参数错误: {0}")]
    Validation(String),

    #[error("余额不足: {0}")]
    InsufficientFunds(String),

    #[error("未登录或登录已过期: {0}")]
    Unauthorized(String),

    #[error("无权操作: {0}")]
    Forbidden(String),

    #[error("对象不存在: {0}")]
    NotFound(String),

    #[error("业务错误: {0}")]
    Business(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn database(msg: impl Into<String>) -> Self {
        AppError::Database(msg.into())
    }

    pub fn redis(msg: impl Into<String>) -> Self {
        AppError::Redis(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        AppError::InsufficientFunds(msg.into())
    }

    /// 未登录/会话失效
    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn business(msg: impl Into<String>) -> Self {
        AppError::Business(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// 响应体里的业务错误码
    pub fn error_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::Business(_) => 400,
            AppError::InsufficientFunds(_) => CODE_INSUFFICIENT_FUNDS,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Config(_)
            | AppError::Internal(_) => 500,
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Redis(_) | AppError::Config(_) | AppError::Internal(_)
        )
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Business(_)
            | AppError::InsufficientFunds(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // 服务端错误只在日志里留详情, 不把内部信息带给客户端
        let msg = if self.is_server_error() {
            log::error!("服务端错误: {}", self);
            "内部服务器错误".to_string()
        } else {
            self.to_string()
        };
        let body: R<()> = R::error(self.error_code(), msg);
        HttpResponse::build(self.status_code()).json(body)
    }
}

// 从 rbatis 错误转换 (rbatis::Error 包含了 rbdc::Error)
impl From<rbatis::Error> for AppError {
    fn from(err: rbatis::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

// 从 deadpool-redis 错误转换
impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<deadpool_redis::redis::RedisError> for AppError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::auth("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::insufficient_funds("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::database("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_funds_has_own_code() {
        // 余额不足和普通 400 在响应体里必须能区分开
        assert_eq!(AppError::insufficient_funds("x").error_code(), CODE_INSUFFICIENT_FUNDS);
        assert_eq!(AppError::validation("x").error_code(), 400);
        assert_ne!(
            AppError::insufficient_funds("x").error_code(),
            AppError::validation("x").error_code()
        );
    }
}
