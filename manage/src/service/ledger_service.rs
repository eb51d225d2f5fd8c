use std::sync::Arc;

use common::enums::AccountChangeType;
use common::error::{AppError, AppResult};
use orm::entities::{AppAccountChange, AppUser};
use rbatis::executor::{Executor, RBatisTxExecutorGuard};
use rbatis::rbdc::datetime::DateTime;
use rbatis::RBatis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::op_log;

/// 划转方向，以被操作用户为参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// 上分：操作人 -> 目标用户
    Deposit,
    /// 下分：目标用户 -> 操作人
    Withdraw,
}

/// 划转请求
#[derive(Debug, Clone)]
pub struct TransferReq {
    pub target_id: i64,
    pub kind: TransferKind,
    pub amount: Decimal,
    pub note: Option<String>,
    pub ip: Option<String>,
}

/// FOR UPDATE 加锁后读到的账户快照
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSnapshot {
    pub id: i64,
    pub balance: Decimal,
}

/// 复式流水的一条腿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerLeg {
    pub user_id: i64,
    pub change_type: AccountChangeType,
    /// 恒为正数
    pub amount: Decimal,
    pub before_amount: Decimal,
    pub after_amount: Decimal,
}

impl LedgerLeg {
    /// 带符号余额变动
    pub fn delta(&self) -> Decimal {
        self.amount * Decimal::from(self.change_type.sign())
    }
}

/// 一笔划转的完整记账计划：借贷各一条腿
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub debit: LedgerLeg,
    pub credit: LedgerLeg,
}

/// 纯计算：根据两侧快照算出新余额和两条流水腿
///
/// 出账侧 change_type 为下分(负)，入账侧为上分(正)，金额恒正。
pub fn plan_transfer(
    from: &AccountSnapshot,
    to: &AccountSnapshot,
    amount: Decimal,
) -> AppResult<TransferPlan> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("划转金额必须大于 0"));
    }
    if from.id == to.id {
        return Err(AppError::validation("转出和转入不能是同一账户"));
    }
    if from.balance < amount {
        return Err(AppError::insufficient_funds(format!(
            "当前余额 {}, 需要 {}",
            from.balance, amount
        )));
    }
    Ok(TransferPlan {
        debit: LedgerLeg {
            user_id: from.id,
            change_type: AccountChangeType::Withdraw,
            amount,
            before_amount: from.balance,
            after_amount: from.balance - amount,
        },
        credit: LedgerLeg {
            user_id: to.id,
            change_type: AccountChangeType::Deposit,
            amount,
            before_amount: to.balance,
            after_amount: to.balance + amount,
        },
    })
}

/// 划转结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub serial_no: String,
    pub amount: Decimal,
    /// 操作人划转后余额
    pub operator_balance: Decimal,
    /// 目标用户划转后余额
    pub target_balance: Decimal,
}

/// 一键回收结果，余额为零时 serial_no 为空
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawAllOutcome {
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
}

/// 资金划转服务
///
/// 权限校验在进入本服务前完成，这里只负责资金一致性：
/// 两个账户按 id 升序 FOR UPDATE 加锁，余额更新、两条账变、
/// 操作日志在同一事务内落库。
pub struct LedgerService {
    rb: Arc<RBatis>,
}

impl LedgerService {
    pub fn new(rb: Arc<RBatis>) -> Self {
        Self { rb }
    }

    /// 后台上分/下分
    pub async fn transfer(&self, operator: &AppUser, req: TransferReq) -> AppResult<TransferOutcome> {
        let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let (from_id, to_id) = match req.kind {
            TransferKind::Deposit => (operator_id, req.target_id),
            TransferKind::Withdraw => (req.target_id, operator_id),
        };
        if from_id == to_id {
            return Err(AppError::validation("转出和转入不能是同一账户"));
        }
        if req.amount <= Decimal::ZERO {
            return Err(AppError::validation("划转金额必须大于 0"));
        }

        let tx = self.rb.acquire_begin().await?;
        let mut tx = tx.defer_async(|mut tx| async move {
            if !tx.done() {
                let _ = tx.rollback().await;
                log::warn!("⚠️ 划转事务提前退出, 已自动回滚");
            }
        });

        let result = Self::transfer_in_tx(&mut tx, operator, operator_id, from_id, to_id, &req).await;
        match result {
            Ok(outcome) => {
                tx.commit().await?;
                log::info!(
                    "✅ 划转完成: {} -> {} 金额 {} 流水 {}",
                    from_id,
                    to_id,
                    outcome.amount,
                    outcome.serial_no
                );
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    /// 一键回收：把目标用户的全部余额划回操作人
    ///
    /// 余额为零时不产生流水，但仍写操作日志留痕。
    pub async fn withdraw_all(
        &self,
        operator: &AppUser,
        target_id: i64,
        ip: Option<String>,
    ) -> AppResult<WithdrawAllOutcome> {
        let operator_id = operator.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        if operator_id == target_id {
            return Err(AppError::validation("不能对自己执行回收"));
        }

        let tx = self.rb.acquire_begin().await?;
        let mut tx = tx.defer_async(|mut tx| async move {
            if !tx.done() {
                let _ = tx.rollback().await;
                log::warn!("⚠️ 回收事务提前退出, 已自动回滚");
            }
        });

        let result = Self::withdraw_all_in_tx(&mut tx, operator, operator_id, target_id, ip).await;
        match result {
            Ok(outcome) => {
                tx.commit().await?;
                log::info!(
                    "✅ 回收完成: 用户 {} 金额 {} 流水 {:?}",
                    target_id,
                    outcome.amount,
                    outcome.serial_no
                );
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn transfer_in_tx(
        tx: &mut RBatisTxExecutorGuard,
        operator: &AppUser,
        operator_id: i64,
        from_id: i64,
        to_id: i64,
        req: &TransferReq,
    ) -> AppResult<TransferOutcome> {
        let (from, to) = Self::lock_pair(tx, from_id, to_id).await?;
        let plan = plan_transfer(&from, &to, req.amount)?;

        let serial_no = Uuid::new_v4().to_string();
        Self::apply_leg(tx, &serial_no, operator_id, &plan.debit, &req.note).await?;
        Self::apply_leg(tx, &serial_no, operator_id, &plan.credit, &req.note).await?;
        op_log::record(
            tx,
            operator,
            "transfer",
            Some(req.target_id),
            req.note.clone(),
            req.ip.clone(),
            serde_json::json!({
                "serialNo": serial_no,
                "fromUserId": from_id,
                "toUserId": to_id,
                "amount": req.amount,
            }),
        )
        .await?;

        let (operator_balance, target_balance) = if operator_id == from_id {
            (plan.debit.after_amount, plan.credit.after_amount)
        } else {
            (plan.credit.after_amount, plan.debit.after_amount)
        };
        Ok(TransferOutcome {
            serial_no,
            amount: req.amount,
            operator_balance,
            target_balance,
        })
    }

    async fn withdraw_all_in_tx(
        tx: &mut RBatisTxExecutorGuard,
        operator: &AppUser,
        operator_id: i64,
        target_id: i64,
        ip: Option<String>,
    ) -> AppResult<WithdrawAllOutcome> {
        let (target, operator_snap) = Self::lock_pair(tx, target_id, operator_id).await?;
        let amount = target.balance;

        // 余额为零(或脏数据为负)时只留痕, 不动账
        if amount <= Decimal::ZERO {
            op_log::record(
                tx,
                operator,
                "withdrawAll",
                Some(target_id),
                None,
                ip,
                serde_json::json!({ "userId": target_id, "amount": amount }),
            )
            .await?;
            return Ok(WithdrawAllOutcome {
                amount: Decimal::ZERO,
                serial_no: None,
            });
        }

        let plan = plan_transfer(&target, &operator_snap, amount)?;
        let serial_no = Uuid::new_v4().to_string();
        Self::apply_leg(tx, &serial_no, operator_id, &plan.debit, &None).await?;
        Self::apply_leg(tx, &serial_no, operator_id, &plan.credit, &None).await?;
        op_log::record(
            tx,
            operator,
            "withdrawAll",
            Some(target_id),
            None,
            ip,
            serde_json::json!({
                "serialNo": serial_no,
                "userId": target_id,
                "amount": amount,
            }),
        )
        .await?;
        Ok(WithdrawAllOutcome {
            amount,
            serial_no: Some(serial_no),
        })
    }

    /// 固定按 id 升序加锁, 避免两笔反向划转互相死锁
    async fn lock_pair(
        tx: &mut RBatisTxExecutorGuard,
        first_id: i64,
        second_id: i64,
    ) -> AppResult<(AccountSnapshot, AccountSnapshot)> {
        let (lo, hi) = if first_id < second_id {
            (first_id, second_id)
        } else {
            (second_id, first_id)
        };
        let lo_snap = Self::lock_account(tx, lo).await?;
        let hi_snap = Self::lock_account(tx, hi).await?;
        if first_id == lo {
            Ok((lo_snap, hi_snap))
        } else {
            Ok((hi_snap, lo_snap))
        }
    }

    async fn lock_account(
        tx: &mut RBatisTxExecutorGuard,
        user_id: i64,
    ) -> AppResult<AccountSnapshot> {
        let row: Option<AccountSnapshot> = tx
            .query_decode(
                "SELECT id, balance FROM app_user WHERE id = ? FOR UPDATE",
                vec![user_id.into()],
            )
            .await?;
        row.ok_or_else(|| AppError::not_found(format!("用户 {} 不存在", user_id)))
    }

    /// 落一条腿：更新余额 + 插入账变
    async fn apply_leg(
        tx: &mut RBatisTxExecutorGuard,
        serial_no: &str,
        operator_id: i64,
        leg: &LedgerLeg,
        note: &Option<String>,
    ) -> AppResult<()> {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        tx.exec(
            "UPDATE app_user SET balance = ?, update_time = ? WHERE id = ?",
            vec![
                leg.after_amount.to_string().into(),
                now.into(),
                leg.user_id.into(),
            ],
        )
        .await?;

        let change = AppAccountChange {
            id: None,
            serial_no: Some(serial_no.to_string()),
            user_id: Some(leg.user_id),
            operator_id: Some(operator_id),
            change_type: Some(leg.change_type.get_code()),
            amount: Some(leg.amount),
            before_amount: Some(leg.before_amount),
            after_amount: Some(leg.after_amount),
            op_note: note.clone(),
            create_time: Some(DateTime::now()),
        };
        AppAccountChange::insert(tx, &change).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn snap(id: i64, balance: &str) -> AccountSnapshot {
        AccountSnapshot {
            id,
            balance: d(balance),
        }
    }

    #[test]
    fn test_plan_moves_full_balance() {
        // 500 全部划走后出账侧归零
        let plan = plan_transfer(&snap(3, "500"), &snap(2, "1000"), d("500")).unwrap();
        assert_eq!(plan.debit.user_id, 3);
        assert_eq!(plan.debit.before_amount, d("500"));
        assert_eq!(plan.debit.after_amount, d("0"));
        assert_eq!(plan.credit.user_id, 2);
        assert_eq!(plan.credit.before_amount, d("1000"));
        assert_eq!(plan.credit.after_amount, d("1500"));
    }

    #[test]
    fn test_plan_conserves_total() {
        let plan = plan_transfer(&snap(1, "80.5"), &snap(2, "19.5"), d("30.25")).unwrap();
        assert_eq!(plan.debit.delta() + plan.credit.delta(), Decimal::ZERO);
        assert_eq!(
            plan.debit.after_amount + plan.credit.after_amount,
            d("80.5") + d("19.5")
        );
    }

    #[test]
    fn test_plan_change_types_and_signs() {
        let plan = plan_transfer(&snap(1, "100"), &snap(2, "0"), d("40")).unwrap();
        assert_eq!(plan.debit.change_type, AccountChangeType::Withdraw);
        assert_eq!(plan.credit.change_type, AccountChangeType::Deposit);
        // 金额恒正, 方向由类型携带
        assert!(plan.debit.amount > Decimal::ZERO);
        assert!(plan.credit.amount > Decimal::ZERO);
        assert_eq!(plan.debit.delta(), d("-40"));
        assert_eq!(plan.credit.delta(), d("40"));
    }

    #[test]
    fn test_plan_rejects_insufficient_funds() {
        let err = plan_transfer(&snap(1, "10"), &snap(2, "0"), d("10.01")).unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds(_)));
        // 刚好够则放行
        assert!(plan_transfer(&snap(1, "10"), &snap(2, "0"), d("10")).is_ok());
    }

    #[test]
    fn test_plan_rejects_non_positive_amount() {
        let err = plan_transfer(&snap(1, "10"), &snap(2, "0"), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = plan_transfer(&snap(1, "10"), &snap(2, "0"), d("-5")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_plan_rejects_self_transfer() {
        let err = plan_transfer(&snap(7, "10"), &snap(7, "10"), d("1")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_transfer_kind_wire_format() {
        let kind: TransferKind = serde_json::from_str("\"deposit\"").unwrap();
        assert_eq!(kind, TransferKind::Deposit);
        let kind: TransferKind = serde_json::from_str("\"withdraw\"").unwrap();
        assert_eq!(kind, TransferKind::Withdraw);
        assert!(serde_json::from_str::<TransferKind>("\"refund\"").is_err());
    }
}
