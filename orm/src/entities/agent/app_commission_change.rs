use rbatis::crud;
use rbatis::rbdc::datetime::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 占成/退水调整历史表（追加写，不更新）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppCommissionChange {
    pub id: Option<i64>,
    /// 被调整的代理/会员
    pub agent_id: Option<i64>,
    pub operator_id: Option<i64>,
    /// 调整项: share 占成, rebate 退水
    pub change_type: Option<String>,
    pub old_value: Option<Decimal>,
    pub new_value: Option<Decimal>,
    pub game_category: Option<String>,
    pub platform: Option<String>,
    pub create_time: Option<DateTime>,
}

crud!(AppCommissionChange {}, "app_commission_change");

impl AppCommissionChange {
    pub const TABLE_NAME: &'static str = "app_commission_change";

    pub const TYPE_SHARE: &'static str = "share";
    pub const TYPE_REBATE: &'static str = "rebate";
}
