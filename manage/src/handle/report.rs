use actix_web::{get, web, Responder};
use common::error::AppError;
use common::middleware::LoginUser;
use common::response::R;

use crate::service::report_service::ReportQuery;
use crate::state::AppState;

/// GET /api/agent/dashboard
/// 工作台：本节点概况 + 今日全子树汇总
#[get("/api/agent/dashboard")]
pub async fn dashboard(
    state: web::Data<AppState>,
    login: LoginUser,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state.report_service.dashboard(&viewer).await?;
    R::success(vo)
}

/// GET /api/agent/report/agent
/// 代理报表：汇总三行 + 每个直属代理一行；viewAgentId 下钻受查看域校验
#[get("/api/agent/report/agent")]
pub async fn agent_report(
    state: web::Data<AppState>,
    login: LoginUser,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state
        .report_service
        .agent_report(&viewer, query.into_inner())
        .await?;
    R::success(vo)
}

/// GET /api/agent/report/member
/// 会员报表：汇总三行 + 每个直属会员一行
#[get("/api/agent/report/member")]
pub async fn member_report(
    state: web::Data<AppState>,
    login: LoginUser,
    query: web::Query<ReportQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state
        .report_service
        .member_report(&viewer, query.into_inner())
        .await?;
    R::success(vo)
}
