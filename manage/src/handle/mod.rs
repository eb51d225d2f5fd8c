pub mod agent;
pub mod report;
pub mod user;

use actix_web::HttpRequest;

/// 客户端IP，优先 X-Forwarded-For / Forwarded 头，其次对端地址
pub fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(|addr| addr.to_string())
}
