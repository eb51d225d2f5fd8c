use common::error::AppResult;
use orm::entities::{AppUser, SysOptLog};
use rbatis::executor::Executor;
use rbatis::rbdc::datetime::DateTime;

/// 操作日志统一落库，执行器由调用方传入（事务内或直连均可）
pub async fn record(
    executor: &dyn Executor,
    operator: &AppUser,
    action: &str,
    target_user_id: Option<i64>,
    remark: Option<String>,
    ip: Option<String>,
    payload: serde_json::Value,
) -> AppResult<()> {
    let row = SysOptLog {
        id: None,
        opt_user_id: operator.id,
        opt_user: operator.account.clone(),
        target_user_id,
        ip,
        action: Some(action.to_string()),
        remark,
        json: Some(payload.to_string()),
        create_time: Some(DateTime::now()),
    };
    SysOptLog::insert(executor, &row).await?;
    Ok(())
}
