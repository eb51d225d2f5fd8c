use std::collections::HashMap;
use std::sync::Arc;

use common::constants::{MAX_AGENT_LEVEL, MEMBER_LEVEL};
use common::enums::UserRole;
use common::error::{AppError, AppResult};
use common::response::{PageReq, PageVo};
use common::utils::invite_code;
use orm::entities::{AppAccountChange, AppCommissionChange, AppUser};
use rbatis::executor::{Executor, RBatisTxExecutorGuard};
use rbatis::rbdc::datetime::DateTime;
use rbatis::RBatis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::service::downline_service::{ChildCounts, DownlineService};
use crate::service::op_log;
use crate::service::permission;

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// 新建下级请求，代理和会员共用，角色由路由决定
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDownlineReq {
    pub account: String,
    pub password: String,
    pub nickname: Option<String>,
    pub phone: Option<String>,
    pub share_percent: Option<Decimal>,
    pub rebate_percent: Option<Decimal>,
    pub remark: Option<String>,
}

/// 资料编辑，只更新出现的字段
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileReq {
    pub nickname: Option<String>,
    pub password: Option<String>,
}

/// 状态开关命令，只更新出现的字段
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// 1 正常, 0 停用
    pub status: Option<i32>,
    pub is_locked: Option<bool>,
    pub is_full_disabled: Option<bool>,
    pub is_readonly: Option<bool>,
}

impl StatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.is_locked.is_none()
            && self.is_full_disabled.is_none()
            && self.is_readonly.is_none()
    }
}

/// 占成/退水调整请求
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShareReq {
    pub share_percent: Option<Decimal>,
    pub rebate_percent: Option<Decimal>,
    pub game_category: Option<String>,
    pub platform: Option<String>,
}

/// 下级列表行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownlineUserVo {
    pub id: i64,
    pub account: Option<String>,
    pub nickname: Option<String>,
    pub role: Option<i32>,
    pub agent_level: Option<i32>,
    pub balance: Option<Decimal>,
    pub share_percent: Option<Decimal>,
    pub rebate_percent: Option<Decimal>,
    pub status: Option<i32>,
    pub is_locked: Option<bool>,
    pub is_full_disabled: Option<bool>,
    pub is_readonly: Option<bool>,
    pub invite_code: Option<String>,
    pub phone: Option<String>,
    pub create_time: Option<DateTime>,
    pub last_login_time: Option<DateTime>,
    pub agent_count: u64,
    pub member_count: u64,
}

impl DownlineUserVo {
    fn from_user(user: AppUser, counts: ChildCounts) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            account: user.account,
            nickname: user.nickname,
            role: user.role,
            agent_level: user.agent_level,
            balance: user.balance,
            share_percent: user.share_percent,
            rebate_percent: user.rebate_percent,
            status: user.status,
            is_locked: user.is_locked,
            is_full_disabled: user.is_full_disabled,
            is_readonly: user.is_readonly,
            invite_code: user.invite_code,
            phone: user.phone,
            create_time: user.create_time,
            last_login_time: user.last_login_time,
            agent_count: counts.agents,
            member_count: counts.members,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSettingsVo {
    pub user_id: i64,
    pub share_percent: Decimal,
    pub rebate_percent: Decimal,
}

/// 占成/退水调整历史行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareHistoryVo {
    pub id: i64,
    pub change_type: Option<String>,
    pub old_value: Option<Decimal>,
    pub new_value: Option<Decimal>,
    pub game_category: Option<String>,
    pub platform: Option<String>,
    pub operator_id: Option<i64>,
    pub create_time: Option<DateTime>,
}

impl From<AppCommissionChange> for ShareHistoryVo {
    fn from(row: AppCommissionChange) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            change_type: row.change_type,
            old_value: row.old_value,
            new_value: row.new_value,
            game_category: row.game_category,
            platform: row.platform,
            operator_id: row.operator_id,
            create_time: row.create_time,
        }
    }
}

/// 账变流水行
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionVo {
    pub id: i64,
    pub serial_no: Option<String>,
    pub change_type: Option<i32>,
    pub change_type_name: Option<String>,
    pub amount: Option<Decimal>,
    pub before_amount: Option<Decimal>,
    pub after_amount: Option<Decimal>,
    pub op_note: Option<String>,
    pub operator_id: Option<i64>,
    pub create_time: Option<DateTime>,
}

impl From<AppAccountChange> for TransactionVo {
    fn from(row: AppAccountChange) -> Self {
        let change_type_name = row.change_type_name();
        Self {
            id: row.id.unwrap_or_default(),
            serial_no: row.serial_no,
            change_type: row.change_type,
            change_type_name,
            amount: row.amount,
            before_amount: row.before_amount,
            after_amount: row.after_amount,
            op_note: row.op_note,
            operator_id: row.operator_id,
            create_time: row.create_time,
        }
    }
}

/// 代理/会员后台管理服务
///
/// 变更类入口都在这里做变更域校验（管理员或直属上级，见 permission），
/// 查看类入口做子树可见性校验。
pub struct AgentService {
    rb: Arc<RBatis>,
    downline: Arc<DownlineService>,
}

impl AgentService {
    pub fn new(rb: Arc<RBatis>, downline: Arc<DownlineService>) -> Self {
        Self { rb, downline }
    }

    /// 按ID取用户, 不存在即 404
    pub async fn load_user(&self, id: i64) -> AppResult<AppUser> {
        AppUser::select_by_id(self.rb.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("用户 {} 不存在", id)))
    }

    /// 查看域校验: 管理员或子树内节点
    pub async fn ensure_view_scope(&self, viewer: &AppUser, target_id: i64) -> AppResult<()> {
        if viewer.is_admin() {
            return Ok(());
        }
        let viewer_id = viewer.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        if self.downline.is_in_subtree(viewer_id, target_id).await? {
            Ok(())
        } else {
            Err(AppError::forbidden("目标用户不在您的下级范围内"))
        }
    }

    /// 创建下级代理/会员
    ///
    /// 层级推导: 会员固定 5 级, 代理为创建人层级+1 且封顶 5 级;
    /// 非管理员创建时占成/退水不能超过自己持有的比例。
    pub async fn create_downline(
        &self,
        creator: &AppUser,
        role: UserRole,
        req: CreateDownlineReq,
        ip: Option<String>,
    ) -> AppResult<i64> {
        let creator_id = creator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        if !(creator.is_admin() || creator.is_agent()) {
            return Err(AppError::forbidden("只有管理员或代理可以创建下级"));
        }

        let account = req.account.trim().to_string();
        if account.is_empty() {
            return Err(AppError::validation("账号不能为空"));
        }
        if req.password.trim().is_empty() {
            return Err(AppError::validation("密码不能为空"));
        }
        if AppUser::select_by_account(self.rb.as_ref(), &account)
            .await?
            .is_some()
        {
            return Err(AppError::business("账号已存在"));
        }

        let share = req.share_percent.unwrap_or(Decimal::ZERO);
        let rebate = req.rebate_percent.unwrap_or(Decimal::ZERO);
        Self::check_percent_range(share, "占成")?;
        Self::check_percent_range(rebate, "退水")?;
        if !creator.is_admin() {
            let share_ceiling = creator.share_percent.unwrap_or(Decimal::ZERO);
            let rebate_ceiling = creator.rebate_percent.unwrap_or(Decimal::ZERO);
            if share > share_ceiling {
                return Err(AppError::validation(format!(
                    "占成不能超过您自己的 {}%",
                    share_ceiling
                )));
            }
            if rebate > rebate_ceiling {
                return Err(AppError::validation(format!(
                    "退水不能超过您自己的 {}%",
                    rebate_ceiling
                )));
            }
        }

        let agent_level = match role {
            UserRole::Admin => return Err(AppError::validation("不能创建管理员账号")),
            UserRole::Member => MEMBER_LEVEL,
            UserRole::Agent => (creator.agent_level.unwrap_or(0) + 1).min(MAX_AGENT_LEVEL),
        };

        let tx = self.rb.acquire_begin().await?;
        let mut tx = tx.defer_async(|mut tx| async move {
            if !tx.done() {
                let _ = tx.rollback().await;
                log::warn!("⚠️ 创建下级事务提前退出, 已自动回滚");
            }
        });

        let result = Self::create_in_tx(
            &mut tx, creator, creator_id, role, agent_level, &account, share, rebate, &req, ip,
        )
        .await;
        match result {
            Ok(new_id) => {
                tx.commit().await?;
                log::info!("✅ 新建{}成功: {} (id={})", role.description(), account, new_id);
                Ok(new_id)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_in_tx(
        tx: &mut RBatisTxExecutorGuard,
        creator: &AppUser,
        creator_id: i64,
        role: UserRole,
        agent_level: i32,
        account: &str,
        share: Decimal,
        rebate: Decimal,
        req: &CreateDownlineReq,
        ip: Option<String>,
    ) -> AppResult<i64> {
        let now = DateTime::now();
        let user = AppUser {
            id: None,
            account: Some(account.to_string()),
            nickname: req.nickname.clone().or_else(|| Some(account.to_string())),
            password: Some(req.password.clone()),
            role: Some(role.get_code()),
            parent_id: Some(creator_id),
            agent_level: Some(agent_level),
            balance: Some(Decimal::ZERO),
            share_percent: Some(share),
            rebate_percent: Some(rebate),
            status: Some(1),
            is_locked: Some(false),
            is_full_disabled: Some(false),
            is_readonly: Some(false),
            invite_code: None,
            phone: req.phone.clone(),
            remark: req.remark.clone(),
            create_time: Some(now.clone()),
            update_time: Some(now),
            last_login_time: None,
        };
        let res = AppUser::insert(tx, &user).await?;
        let new_id = res
            .last_insert_id
            .as_i64()
            .ok_or_else(|| AppError::database("无法取得新用户ID"))?;

        // 邀请码由自增ID推导, 先插入后回填
        let code = invite_code::generate_for_id(new_id);
        tx.exec(
            "UPDATE app_user SET invite_code = ? WHERE id = ?",
            vec![code.clone().into(), new_id.into()],
        )
        .await?;

        let action = match role {
            UserRole::Agent => "createAgent",
            _ => "createMember",
        };
        op_log::record(
            tx,
            creator,
            action,
            Some(new_id),
            None,
            ip,
            serde_json::json!({
                "userId": new_id,
                "account": account,
                "agentLevel": agent_level,
                "sharePercent": share,
                "rebatePercent": rebate,
                "inviteCode": code,
            }),
        )
        .await?;
        Ok(new_id)
    }

    /// 修改昵称/密码，允许本人或直属上级（或管理员）
    pub async fn update_profile(
        &self,
        operator: &AppUser,
        target_id: i64,
        req: UpdateProfileReq,
        ip: Option<String>,
    ) -> AppResult<()> {
        let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let target = self.load_user(target_id).await?;
        if !permission::can_edit_profile(
            operator_id,
            operator.role_enum(),
            target_id,
            target.parent_id.unwrap_or_default(),
        ) {
            return Err(AppError::forbidden("只能修改自己或直属下级的资料"));
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut args: Vec<rbs::Value> = Vec::new();
        let mut changed: Vec<&str> = Vec::new();
        if let Some(nickname) = req.nickname.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sets.push("nickname = ?");
            args.push(nickname.into());
            changed.push("nickname");
        }
        if let Some(password) = req.password.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sets.push("password = ?");
            args.push(password.into());
            changed.push("password");
        }
        if sets.is_empty() {
            return Err(AppError::validation("没有需要修改的字段"));
        }
        sets.push("update_time = ?");
        args.push(chrono::Local::now().format(TIME_FMT).to_string().into());
        let sql = format!("UPDATE app_user SET {} WHERE id = ?", sets.join(", "));
        args.push(target_id.into());

        self.exec_with_log(
            sql,
            args,
            operator,
            "updateProfile",
            target_id,
            ip,
            serde_json::json!({ "userId": target_id, "fields": changed }),
        )
        .await
    }

    /// 状态开关（停用/锁定/禁用全部/只读）
    pub async fn update_status(
        &self,
        operator: &AppUser,
        target_id: i64,
        cmd: StatusUpdate,
        ip: Option<String>,
    ) -> AppResult<()> {
        let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let target = self.load_user(target_id).await?;
        if !permission::can_mutate(
            operator_id,
            operator.role_enum(),
            target.parent_id.unwrap_or_default(),
        ) {
            return Err(AppError::forbidden("只能操作直属下级"));
        }
        if cmd.is_empty() {
            return Err(AppError::validation("没有需要修改的状态"));
        }
        if let Some(status) = cmd.status {
            if status != 0 && status != 1 {
                return Err(AppError::validation("状态只能是 0 或 1"));
            }
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut args: Vec<rbs::Value> = Vec::new();
        if let Some(v) = cmd.status {
            sets.push("status = ?");
            args.push(v.into());
        }
        if let Some(v) = cmd.is_locked {
            sets.push("is_locked = ?");
            args.push(v.into());
        }
        if let Some(v) = cmd.is_full_disabled {
            sets.push("is_full_disabled = ?");
            args.push(v.into());
        }
        if let Some(v) = cmd.is_readonly {
            sets.push("is_readonly = ?");
            args.push(v.into());
        }
        sets.push("update_time = ?");
        args.push(chrono::Local::now().format(TIME_FMT).to_string().into());
        let sql = format!("UPDATE app_user SET {} WHERE id = ?", sets.join(", "));
        args.push(target_id.into());

        self.exec_with_log(
            sql,
            args,
            operator,
            "updateStatus",
            target_id,
            ip,
            serde_json::json!({ "userId": target_id, "cmd": cmd }),
        )
        .await
    }

    /// 查看占成/退水设置
    pub async fn get_share_settings(
        &self,
        viewer: &AppUser,
        target_id: i64,
    ) -> AppResult<ShareSettingsVo> {
        self.ensure_view_scope(viewer, target_id).await?;
        let target = self.load_user(target_id).await?;
        Ok(ShareSettingsVo {
            user_id: target_id,
            share_percent: target.share_percent.unwrap_or_default(),
            rebate_percent: target.rebate_percent.unwrap_or_default(),
        })
    }

    /// 调整占成/退水
    ///
    /// 每个实际发生变化的值追加一条调整历史；值与当前相同不落任何记录。
    pub async fn update_share_settings(
        &self,
        operator: &AppUser,
        target_id: i64,
        req: UpdateShareReq,
        ip: Option<String>,
    ) -> AppResult<()> {
        let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let target = self.load_user(target_id).await?;
        if !permission::can_mutate(
            operator_id,
            operator.role_enum(),
            target.parent_id.unwrap_or_default(),
        ) {
            return Err(AppError::forbidden("只能操作直属下级"));
        }
        if req.share_percent.is_none() && req.rebate_percent.is_none() {
            return Err(AppError::validation("没有需要修改的比例"));
        }

        if let Some(share) = req.share_percent {
            Self::check_percent_range(share, "占成")?;
            if !operator.is_admin() {
                let ceiling = operator.share_percent.unwrap_or(Decimal::ZERO);
                if share > ceiling {
                    return Err(AppError::validation(format!(
                        "占成不能超过您自己的 {}%",
                        ceiling
                    )));
                }
            }
        }
        if let Some(rebate) = req.rebate_percent {
            Self::check_percent_range(rebate, "退水")?;
            if !operator.is_admin() {
                let ceiling = operator.rebate_percent.unwrap_or(Decimal::ZERO);
                if rebate > ceiling {
                    return Err(AppError::validation(format!(
                        "退水不能超过您自己的 {}%",
                        ceiling
                    )));
                }
            }
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut args: Vec<rbs::Value> = Vec::new();
        let mut history: Vec<AppCommissionChange> = Vec::new();
        let now = DateTime::now();
        if let Some(new_share) = req.share_percent {
            let old = target.share_percent.unwrap_or(Decimal::ZERO);
            if new_share != old {
                sets.push("share_percent = ?");
                args.push(new_share.to_string().into());
                history.push(Self::history_row(
                    AppCommissionChange::TYPE_SHARE,
                    target_id,
                    operator_id,
                    old,
                    new_share,
                    &req,
                    &now,
                ));
            }
        }
        if let Some(new_rebate) = req.rebate_percent {
            let old = target.rebate_percent.unwrap_or(Decimal::ZERO);
            if new_rebate != old {
                sets.push("rebate_percent = ?");
                args.push(new_rebate.to_string().into());
                history.push(Self::history_row(
                    AppCommissionChange::TYPE_REBATE,
                    target_id,
                    operator_id,
                    old,
                    new_rebate,
                    &req,
                    &now,
                ));
            }
        }
        // 值都没变, 幂等返回
        if sets.is_empty() {
            return Ok(());
        }
        sets.push("update_time = ?");
        args.push(chrono::Local::now().format(TIME_FMT).to_string().into());
        let sql = format!("UPDATE app_user SET {} WHERE id = ?", sets.join(", "));
        args.push(target_id.into());

        let tx = self.rb.acquire_begin().await?;
        let mut tx = tx.defer_async(|mut tx| async move {
            if !tx.done() {
                let _ = tx.rollback().await;
                log::warn!("⚠️ 占成退水调整事务提前退出, 已自动回滚");
            }
        });

        let result: AppResult<()> = async {
            tx.exec(&sql, args).await?;
            for row in &history {
                AppCommissionChange::insert(&mut tx, row).await?;
            }
            op_log::record(
                &mut tx,
                operator,
                "updateShareSettings",
                Some(target_id),
                None,
                ip,
                serde_json::json!({
                    "userId": target_id,
                    "sharePercent": req.share_percent,
                    "rebatePercent": req.rebate_percent,
                }),
            )
            .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await?;
                log::info!("✅ 占成退水调整完成: 用户 {}", target_id);
                Ok(())
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    /// 占成/退水调整历史
    pub async fn share_history(
        &self,
        viewer: &AppUser,
        target_id: i64,
        page: PageReq,
    ) -> AppResult<PageVo<ShareHistoryVo>> {
        self.ensure_view_scope(viewer, target_id).await?;
        let (limit, offset) = page.limit_offset();
        let total: u64 = self
            .rb
            .query_decode(
                "SELECT COUNT(*) FROM app_commission_change WHERE agent_id = ?",
                vec![target_id.into()],
            )
            .await?;
        let rows: Vec<AppCommissionChange> = self
            .rb
            .query_decode(
                "SELECT * FROM app_commission_change WHERE agent_id = ? \
                 ORDER BY id DESC LIMIT ? OFFSET ?",
                vec![target_id.into(), limit.into(), offset.into()],
            )
            .await?;
        let records = rows.into_iter().map(ShareHistoryVo::from).collect();
        Ok(PageVo::new(total, page.page.max(1), limit, records))
    }

    /// 账变流水
    pub async fn transactions(
        &self,
        viewer: &AppUser,
        target_id: i64,
        page: PageReq,
    ) -> AppResult<PageVo<TransactionVo>> {
        self.ensure_view_scope(viewer, target_id).await?;
        let (limit, offset) = page.limit_offset();
        let total: u64 = self
            .rb
            .query_decode(
                "SELECT COUNT(*) FROM app_account_change WHERE user_id = ?",
                vec![target_id.into()],
            )
            .await?;
        let rows: Vec<AppAccountChange> = self
            .rb
            .query_decode(
                "SELECT * FROM app_account_change WHERE user_id = ? \
                 ORDER BY id DESC LIMIT ? OFFSET ?",
                vec![target_id.into(), limit.into(), offset.into()],
            )
            .await?;
        let records = rows.into_iter().map(TransactionVo::from).collect();
        Ok(PageVo::new(total, page.page.max(1), limit, records))
    }

    /// 直属下级分页列表（代理或会员，按角色区分），代理行带下级数量
    pub async fn page_direct_children(
        &self,
        viewer: &AppUser,
        role: UserRole,
        keyword: Option<&str>,
        page: PageReq,
    ) -> AppResult<PageVo<DownlineUserVo>> {
        let viewer_id = viewer.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let (limit, offset) = page.limit_offset();

        let mut where_sql = String::from("parent_id = ? AND role = ?");
        let mut args: Vec<rbs::Value> = vec![viewer_id.into(), role.get_code().into()];
        if let Some(kw) = keyword.map(str::trim).filter(|s| !s.is_empty()) {
            where_sql.push_str(" AND (account LIKE ? OR nickname LIKE ?)");
            let pattern = format!("%{}%", kw);
            args.push(pattern.clone().into());
            args.push(pattern.into());
        }

        let total: u64 = self
            .rb
            .query_decode(
                &format!("SELECT COUNT(*) FROM app_user WHERE {}", where_sql),
                args.clone(),
            )
            .await?;
        let mut rows_args = args;
        rows_args.push(limit.into());
        rows_args.push(offset.into());
        let rows: Vec<AppUser> = self
            .rb
            .query_decode(
                &format!(
                    "SELECT * FROM app_user WHERE {} ORDER BY id DESC LIMIT ? OFFSET ?",
                    where_sql
                ),
                rows_args,
            )
            .await?;

        // 会员没有下级, 只有代理行需要数下级
        let counts = if role == UserRole::Agent {
            let ids: Vec<i64> = rows.iter().filter_map(|u| u.id).collect();
            self.downline.direct_child_counts(&ids).await?
        } else {
            HashMap::new()
        };
        let records = rows
            .into_iter()
            .map(|u| {
                let c = u.id.and_then(|id| counts.get(&id).copied()).unwrap_or_default();
                DownlineUserVo::from_user(u, c)
            })
            .collect();
        Ok(PageVo::new(total, page.page.max(1), limit, records))
    }

    fn check_percent_range(value: Decimal, label: &str) -> AppResult<()> {
        if value < Decimal::ZERO || value > Decimal::from(100) {
            return Err(AppError::validation(format!("{}必须在 0 到 100 之间", label)));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn history_row(
        change_type: &str,
        agent_id: i64,
        operator_id: i64,
        old_value: Decimal,
        new_value: Decimal,
        req: &UpdateShareReq,
        now: &DateTime,
    ) -> AppCommissionChange {
        AppCommissionChange {
            id: None,
            agent_id: Some(agent_id),
            operator_id: Some(operator_id),
            change_type: Some(change_type.to_string()),
            old_value: Some(old_value),
            new_value: Some(new_value),
            game_category: req.game_category.clone(),
            platform: req.platform.clone(),
            create_time: Some(now.clone()),
        }
    }

    /// 单条 UPDATE 和操作日志放在同一事务里
    #[allow(clippy::too_many_arguments)]
    async fn exec_with_log(
        &self,
        sql: String,
        args: Vec<rbs::Value>,
        operator: &AppUser,
        action: &str,
        target_id: i64,
        ip: Option<String>,
        payload: serde_json::Value,
    ) -> AppResult<()> {
        let tx = self.rb.acquire_begin().await?;
        let mut tx = tx.defer_async(|mut tx| async move {
            if !tx.done() {
                let _ = tx.rollback().await;
                log::warn!("⚠️ 管理操作事务提前退出, 已自动回滚");
            }
        });

        let result: AppResult<()> = async {
            tx.exec(&sql, args).await?;
            op_log::record(&mut tx, operator, action, Some(target_id), None, ip, payload).await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_update_empty_detection() {
        let cmd: StatusUpdate = serde_json::from_str("{}").unwrap();
        assert!(cmd.is_empty());
        let cmd: StatusUpdate = serde_json::from_str(r#"{"isLocked":true}"#).unwrap();
        assert!(!cmd.is_empty());
        assert_eq!(cmd.is_locked, Some(true));
        assert_eq!(cmd.status, None);
    }

    #[test]
    fn test_percent_range_check() {
        use std::str::FromStr;
        assert!(AgentService::check_percent_range(Decimal::ZERO, "占成").is_ok());
        assert!(AgentService::check_percent_range(Decimal::from(100), "占成").is_ok());
        assert!(AgentService::check_percent_range(Decimal::from_str("-0.01").unwrap(), "占成").is_err());
        assert!(AgentService::check_percent_range(Decimal::from_str("100.01").unwrap(), "退水").is_err());
    }

    #[test]
    fn test_create_req_wire_format() {
        let req: CreateDownlineReq = serde_json::from_str(
            r#"{"account":"agt001","password":"pass","sharePercent":"10","rebatePercent":"0.8"}"#,
        )
        .unwrap();
        assert_eq!(req.account, "agt001");
        assert_eq!(req.share_percent, Some(Decimal::from(10)));
        assert!(req.nickname.is_none());
    }
}
