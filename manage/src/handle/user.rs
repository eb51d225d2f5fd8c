use actix_web::{get, post, put, web, HttpRequest, Responder};
use common::error::{AppError, AppResult};
use common::middleware::LoginUser;
use common::response::{PageReq, R};
use orm::entities::AppUser;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::handle::client_ip;
use crate::service::agent_service::{StatusUpdate, UpdateShareReq};
use crate::service::ledger_service::{TransferKind, TransferReq};
use crate::service::permission;
use crate::state::AppState;

/// 划转请求体
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReq {
    /// deposit 上分（操作人→目标），withdraw 下分（目标→操作人）
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub amount: Decimal,
    pub note: Option<String>,
}

/// 划转/回收进入资金服务前的变更域校验
///
/// 隔级上级可以看数字但不能动钱，资金必须经直属上级流转。
fn ensure_mutation_scope(operator: &AppUser, target: &AppUser) -> AppResult<()> {
    let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
    if permission::can_mutate(
        operator_id,
        operator.role_enum(),
        target.parent_id.unwrap_or_default(),
    ) {
        Ok(())
    } else {
        Err(AppError::forbidden("只能操作直属下级"))
    }
}

/// PUT /api/agent/users/{id}/status
/// 状态开关（停用/锁定/禁用全部/只读），只更新出现的字段
#[put("/api/agent/users/{id}/status")]
pub async fn update_status(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    payload: web::Json<StatusUpdate>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let operator = state.agent_service.load_user(login.id).await?;
    state
        .agent_service
        .update_status(&operator, path.into_inner(), payload.into_inner(), client_ip(&req))
        .await?;
    R::ok()
}

/// GET /api/agent/users/{id}/share-settings
#[get("/api/agent/users/{id}/share-settings")]
pub async fn get_share_settings(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state
        .agent_service
        .get_share_settings(&viewer, path.into_inner())
        .await?;
    R::success(vo)
}

/// PUT /api/agent/users/{id}/share-settings
/// 调整占成/退水，实际变化的值各追加一条调整历史
#[put("/api/agent/users/{id}/share-settings")]
pub async fn update_share_settings(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    payload: web::Json<UpdateShareReq>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let operator = state.agent_service.load_user(login.id).await?;
    state
        .agent_service
        .update_share_settings(&operator, path.into_inner(), payload.into_inner(), client_ip(&req))
        .await?;
    R::ok()
}

/// GET /api/agent/users/{id}/share-history
#[get("/api/agent/users/{id}/share-history")]
pub async fn share_history(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    page: web::Query<PageReq>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state
        .agent_service
        .share_history(&viewer, path.into_inner(), page.into_inner())
        .await?;
    R::success(vo)
}

/// GET /api/agent/users/{id}/transactions
/// 单个用户的账变流水（子树可见范围内）
#[get("/api/agent/users/{id}/transactions")]
pub async fn transactions(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    page: web::Query<PageReq>,
) -> Result<impl Responder, AppError> {
    let viewer = state.agent_service.load_user(login.id).await?;
    let vo = state
        .agent_service
        .transactions(&viewer, path.into_inner(), page.into_inner())
        .await?;
    R::success(vo)
}

/// POST /api/agent/users/{id}/balance
/// 后台上分/下分，校验通过后由资金服务在单事务内完成
#[post("/api/agent/users/{id}/balance")]
pub async fn balance_transfer(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    payload: web::Json<BalanceReq>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let target_id = path.into_inner();
    log::info!(
        "收到划转请求: operator={} target={} amount={}",
        login.id,
        target_id,
        payload.amount
    );
    let operator = state.agent_service.load_user(login.id).await?;
    let target = state.agent_service.load_user(target_id).await?;
    ensure_mutation_scope(&operator, &target)?;

    let body = payload.into_inner();
    let outcome = state
        .ledger_service
        .transfer(
            &operator,
            TransferReq {
                target_id,
                kind: body.kind,
                amount: body.amount,
                note: body.note,
                ip: client_ip(&req),
            },
        )
        .await?;
    R::success(outcome)
}

/// POST /api/agent/users/{id}/withdraw-all
/// 一键回收目标用户（仅该节点自身）的全部余额
#[post("/api/agent/users/{id}/withdraw-all")]
pub async fn withdraw_all(
    state: web::Data<AppState>,
    login: LoginUser,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let target_id = path.into_inner();
    log::info!("收到回收请求: operator={} target={}", login.id, target_id);
    let operator = state.agent_service.load_user(login.id).await?;
    let target = state.agent_service.load_user(target_id).await?;
    ensure_mutation_scope(&operator, &target)?;

    let outcome = state
        .ledger_service
        .withdraw_all(&operator, target_id, client_ip(&req))
        .await?;
    R::success(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::enums::UserRole;
    use std::str::FromStr;

    fn user(id: i64, role: UserRole, parent_id: Option<i64>) -> AppUser {
        AppUser {
            id: Some(id),
            account: Some(format!("u{}", id)),
            nickname: None,
            password: None,
            role: Some(role.get_code()),
            parent_id,
            agent_level: None,
            balance: None,
            share_percent: None,
            rebate_percent: None,
            status: None,
            is_locked: None,
            is_full_disabled: None,
            is_readonly: None,
            invite_code: None,
            phone: None,
            remark: None,
            create_time: None,
            update_time: None,
            last_login_time: None,
        }
    }

    #[test]
    fn test_balance_req_wire_format() {
        let req: BalanceReq = serde_json::from_str(
            r#"{"type":"deposit","amount":"100.5","note":"周结"}"#,
        )
        .unwrap();
        assert_eq!(req.kind, TransferKind::Deposit);
        assert_eq!(req.amount, Decimal::from_str("100.5").unwrap());
        assert_eq!(req.note.as_deref(), Some("周结"));

        assert!(serde_json::from_str::<BalanceReq>(r#"{"type":"sweep","amount":"1"}"#).is_err());
    }

    #[test]
    fn test_mutation_scope_direct_parent_only() {
        // 树: 1(管理员) -> 2(代理) -> 3(代理) -> 4(会员)
        let admin = user(1, UserRole::Admin, None);
        let agent2 = user(2, UserRole::Agent, Some(1));
        let agent3 = user(3, UserRole::Agent, Some(2));
        let member4 = user(4, UserRole::Member, Some(3));

        // 直属上级和管理员可以动钱
        assert!(ensure_mutation_scope(&agent3, &member4).is_ok());
        assert!(ensure_mutation_scope(&admin, &member4).is_ok());

        // 隔级上级被拒, 资金必须经 3 流转
        let err = ensure_mutation_scope(&agent2, &member4).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
