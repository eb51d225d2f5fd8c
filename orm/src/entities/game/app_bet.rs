use rbatis::crud;
use rbatis::rbdc::datetime::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 注单表（由游戏端写入，这里只读聚合）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppBet {
    pub id: Option<i64>,
    pub bet_no: Option<String>,
    pub user_id: Option<i64>,
    pub game_category: Option<String>,
    pub platform: Option<String>,
    /// 投注金额
    pub amount: Option<Decimal>,
    /// 派彩金额，未结算为 NULL
    pub payout: Option<Decimal>,
    /// 状态: 0 未结算, 1 已中奖, 2 未中奖
    pub status: Option<i32>,
    pub settle_time: Option<DateTime>,
    pub create_time: Option<DateTime>,
}

crud!(AppBet {}, "app_bet");

impl AppBet {
    pub const TABLE_NAME: &'static str = "app_bet";
}
