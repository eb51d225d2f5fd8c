use rbatis::crud;
use rbatis::rbdc::datetime::DateTime;
use serde::{Deserialize, Serialize};

/// 操作日志
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SysOptLog {
    pub id: Option<i64>,
    pub opt_user_id: Option<i64>,
    pub opt_user: Option<String>,
    /// 被操作的用户
    pub target_user_id: Option<i64>,
    pub ip: Option<String>,
    /// 动作标识，如 transfer / withdrawAll / updateStatus
    pub action: Option<String>,
    pub remark: Option<String>,
    /// 请求/结果快照
    pub json: Option<String>,
    pub create_time: Option<DateTime>,
}

crud!(SysOptLog {}, "sys_opt_log");

impl SysOptLog {
    pub const TABLE_NAME: &'static str = "sys_opt_log";
}
