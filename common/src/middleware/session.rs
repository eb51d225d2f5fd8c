use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::constants::{AUTH_HEADER_NAME, SESSION_KEY_PREFIX, SESSION_TTL_SECONDS};
use crate::error::AppError;
use crate::utils::redis_util::RedisUtil;

/// 当前登录用户（由会话中间件写入请求扩展）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginUser {
    pub id: i64,
}

impl FromRequest for LoginUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<LoginUser>().copied();
        ready(match user {
            Some(u) => Ok(u),
            // 只会出现在未挂载中间件的路由上
            None => Err(AppError::auth("未登录或会话已过期").into()),
        })
    }
}

/// 会话校验中间件 - 自己实现 call 方法的拦截逻辑
///
/// 校验请求携带的 token：在 Redis 中查 `session:{token}` 得到登录用户 id，
/// 写入请求扩展供 `LoginUser` 提取器使用。会话由认证服务登录时写入，这里只读并滑动续期。
#[derive(Clone)]
pub struct SessionAuth {
    redis: RedisUtil,
    /// 每次访问后刷新的会话有效期（秒），0 表示不续期
    touch_ttl: i64,
}

impl SessionAuth {
    pub fn new(redis: RedisUtil) -> Self {
        Self {
            redis,
            touch_ttl: SESSION_TTL_SECONDS,
        }
    }

    /// 指定续期秒数（0 关闭续期）
    pub fn with_touch_ttl(redis: RedisUtil, touch_ttl: i64) -> Self {
        Self { redis, touch_ttl }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthService {
            service: Rc::new(service),
            redis: self.redis.clone(),
            touch_ttl: self.touch_ttl,
        }))
    }
}

pub struct SessionAuthService<S> {
    service: Rc<S>,
    redis: RedisUtil,
    touch_ttl: i64,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let redis = self.redis.clone();
        let touch_ttl = self.touch_ttl;

        Box::pin(async move {
            // 1. 提取 Token
            let token = match extract_token(&req) {
                Some(t) => t,
                None => {
                    log::warn!("⚠️  [Auth] 未提供 Token: {}", req.path());
                    return Err(AppError::auth("未提供登录凭证").into());
                }
            };

            // 2. Redis 中校验会话
            let session_key = format!("{}{}", SESSION_KEY_PREFIX, token);
            let login_id = match redis.get(&session_key).await? {
                Some(v) => v,
                None => {
                    log::warn!("⚠️  [Auth] Token 无效或已过期");
                    return Err(AppError::auth("登录已过期，请重新登录").into());
                }
            };

            let user_id: i64 = match login_id.parse() {
                Ok(id) => id,
                Err(_) => {
                    log::warn!("⚠️  [Auth] 会话内容非法: {}", login_id);
                    return Err(AppError::auth("登录已过期，请重新登录").into());
                }
            };

            // 3. 滑动续期，失败不阻断请求
            if touch_ttl > 0 {
                if let Err(e) = redis.expire(&session_key, touch_ttl).await {
                    log::warn!("⚠️  [Auth] 会话续期失败: {}", e);
                }
            }

            log::debug!("✅ [Auth] 会话验证通过, user_id={}", user_id);

            // 4. 写入请求扩展并继续处理
            req.extensions_mut().insert(LoginUser { id: user_id });
            service.call(req).await
        })
    }
}

/// 从请求中提取 token：优先 Header，其次 Query 参数（导出下载等场景无法带头）
fn extract_token(req: &ServiceRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTH_HEADER_NAME) {
        if let Ok(auth_str) = auth_header.to_str() {
            return Some(extract_bearer_token(auth_str));
        }
    }

    req.query_string().split('&').find_map(|pair| {
        let mut parts = pair.split('=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) if !value.is_empty() => Some(value.to_string()),
            _ => None,
        }
    })
}

/// 提取 Bearer token
fn extract_bearer_token(token: &str) -> String {
    if let Some(stripped) = token.strip_prefix("Bearer ") {
        stripped.to_string()
    } else {
        token.to_string()
    }
}
