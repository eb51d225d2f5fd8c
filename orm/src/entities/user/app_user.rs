use rbatis::rbdc::datetime::DateTime;
use rbatis::{crud, impl_select};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 用户表（管理员/代理/会员同表，parent_id 构成代理树）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    pub id: Option<i64>,
    /// 登录账号，全表唯一
    pub account: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
    /// 角色: 0 管理员, 1 代理, 2 会员
    pub role: Option<i32>,
    /// 上级ID，根节点(管理员)为 NULL
    pub parent_id: Option<i64>,
    /// 代理层级 1-5，会员固定 5
    pub agent_level: Option<i32>,
    pub balance: Option<Decimal>,
    /// 占成比例 0-100
    pub share_percent: Option<Decimal>,
    /// 退水比例 0-100
    pub rebate_percent: Option<Decimal>,
    /// 状态: 1 正常, 0 停用
    pub status: Option<i32>,
    pub is_locked: Option<bool>,
    pub is_full_disabled: Option<bool>,
    pub is_readonly: Option<bool>,
    /// 邀请码，全表唯一
    pub invite_code: Option<String>,
    pub phone: Option<String>,
    pub remark: Option<String>,
    pub create_time: Option<DateTime>,
    pub update_time: Option<DateTime>,
    /// 由认证服务在登录时更新
    pub last_login_time: Option<DateTime>,
}

crud!(AppUser {}, "app_user");
impl_select!(AppUser{select_by_id(id: i64) -> Option => "`where id = #{id} limit 1`"});
impl_select!(AppUser{select_by_account(account: &str) -> Option => "`where account = #{account} limit 1`"});
impl_select!(AppUser{select_by_invite_code(code: &str) -> Option => "`where invite_code = #{code} limit 1`"});

impl AppUser {
    pub const TABLE_NAME: &'static str = "app_user";

    /// 角色枚举，脏数据按最低权限的会员处理
    pub fn role_enum(&self) -> common::enums::UserRole {
        self.role
            .and_then(common::enums::UserRole::from_code)
            .unwrap_or(common::enums::UserRole::Member)
    }

    /// 是否管理员
    pub fn is_admin(&self) -> bool {
        self.role == Some(common::enums::UserRole::Admin.get_code())
    }

    /// 是否代理
    pub fn is_agent(&self) -> bool {
        self.role == Some(common::enums::UserRole::Agent.get_code())
    }
}
