use actix_web::{get, post, put, web, HttpRequest, Responder};
use common::enums::UserRole;
use common::error::AppError;
use common::middleware::LoginUser;
use common::response::{PageReq, R};
use serde::{Deserialize, Serialize};

use crate::handle::client_ip;
use crate::service::agent_service::{CreateDownlineReq, UpdateProfileReq};
use crate::state::AppState;

/// 下级列表查询参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub keyword: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

impl ChildListQuery {
    fn page_req(&self) -> PageReq {
        PageReq {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 新建下级的返回体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedVo {
    pub id: i64,
}

/// GET /api/agent/agents
/// 直属代理分页列表，每行带各自的下级代理/会员数量
#[get("/api/agent/agents")]
pub async fn list_agents(
    state: web::Data<AppState>,
    login: LoginUser,
    query: web::Query<ChildListQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let page = state
        .agent_service
        .page_direct_children(
            &viewer,
            UserRole::Agent,
            query.keyword.as_deref(),
            query.page_req(),
        )
        .await?;
    R::success(page)
}

/// GET /api/agent/members
/// 直属会员分页列表
#[get("/api/agent/members")]
pub async fn list_members(
    state: web::Data<AppState>,
    login: LoginUser,
    query: web::Query<ChildListQuery>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let page = state
        .agent_service
        .page_direct_children(
            &viewer,
            UserRole::Member,
            query.keyword.as_deref(),
            query.page_req(),
        )
        .await?;
    R::success(page)
}

/// POST /api/agent/agents
/// 新建下级代理（上级 = 当前登录人，层级 = 上级+1 封顶 5）
#[post("/api/agent/agents")]
pub async fn create_agent(
    state: web::Data<AppState>,
    login: LoginUser,
    payload: web::Json<CreateDownlineReq>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    log::info!("收到新建代理请求: account={}", payload.account);
    let creator = state.agent_service.load_user(login.id).await?;
    let id = state
        .agent_service
        .create_downline(&creator, UserRole::Agent, payload.into_inner(), client_ip(&req))
        .await?;
    R::success(CreatedVo { id })
}

/// POST /api/agent/members
/// 新建下级会员（固定 5 级）
#[post("/api/agent/members")]
pub async fn create_member(
    state: web::Data<AppState>,
    login: LoginUser,
    payload: web::Json<CreateDownlineReq>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    log::info!("收到新建会员请求: account={}", payload.account);
    let creator = state.agent_service.load_user(login.id).await?;
    let id = state
        .agent_service
        .create_downline(&creator, UserRole::Member, payload.into_inner(), client_ip(&req))
        .await?;
    R::success(CreatedVo { id })
}

/// PUT /api/agent/agents/{id}
/// 修改昵称/密码，允许本人或直属上级（或管理员）
#[put("/api/agent/agents/{id}")]
pub async fn update_agent(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    payload: web::Json<UpdateProfileReq>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let operator = state.agent_service.load_user(login.id).await?;
    state
        .agent_service
        .update_profile(&operator, path.into_inner(), payload.into_inner(), client_ip(&req))
        .await?;
    R::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let q: ChildListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 20);
        assert!(q.keyword.is_none());
    }

    #[test]
    fn test_list_query_wire_format() {
        let q: ChildListQuery =
            serde_json::from_str(r#"{"page":3,"pageSize":50,"keyword":"agt"}"#).unwrap();
        assert_eq!(q.page, 3);
        assert_eq!(q.page_size, 50);
        assert_eq!(q.keyword.as_deref(), Some("agt"));
        assert_eq!(q.page_req().limit_offset(), (50, 100));
    }
}
