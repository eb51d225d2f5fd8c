use common::enums::AccountChangeType;
use rbatis::rbdc::datetime::DateTime;
use rbatis::{crud, impl_select};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 账变记录表（复式流水，一笔划转固定两行，serial_no 相同）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAccountChange {
    pub id: Option<i64>,
    /// 流水号，同一笔业务的借贷两行共用
    pub serial_no: Option<String>,
    /// 账变归属用户
    pub user_id: Option<i64>,
    /// 操作人（后台划转时为发起方）
    pub operator_id: Option<i64>,
    /// 账变类型码，正数入账负数出账
    pub change_type: Option<i32>,
    /// 变动金额，恒为正数，方向看 change_type
    pub amount: Option<Decimal>,
    pub before_amount: Option<Decimal>,
    pub after_amount: Option<Decimal>,
    pub op_note: Option<String>,
    pub create_time: Option<DateTime>,
}

crud!(AppAccountChange {}, "app_account_change");
impl_select!(AppAccountChange{select_by_serial_no(serial_no: &str) => "`where serial_no = #{serial_no} order by id`"});

impl AppAccountChange {
    pub const TABLE_NAME: &'static str = "app_account_change";

    /// 账变类型中文名
    pub fn change_type_name(&self) -> Option<String> {
        self.change_type
            .and_then(AccountChangeType::from_code)
            .map(|t| t.description())
    }
}
