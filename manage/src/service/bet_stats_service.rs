use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use common::enums::BetStatus;
use common::error::AppResult;
use rbatis::RBatis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// SQL 时间参数格式
const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// 一组会员在 [start, end) 内的投注统计
///
/// win_loss 以会员视角带符号：已中奖计 payout - amount，未中奖计 -amount，
/// 未结算计 0 但照记入 bet_count / bet_amount。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetStats {
    pub bet_count: u64,
    /// 投注额与有效投注当前同值，报表两个口径都要求展示
    pub bet_amount: Decimal,
    pub valid_bet: Decimal,
    pub win_loss: Decimal,
}

impl BetStats {
    /// 累加另一份统计
    pub fn merge(&mut self, other: &BetStats) {
        self.bet_count += other.bet_count;
        self.bet_amount += other.bet_amount;
        self.valid_bet += other.valid_bet;
        self.win_loss += other.win_loss;
    }
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    bet_count: u64,
    bet_amount: Decimal,
    win_loss: Decimal,
}

#[derive(Debug, Deserialize)]
struct GroupedStatsRow {
    user_id: i64,
    bet_count: u64,
    bet_amount: Decimal,
    win_loss: Decimal,
}

/// 聚合列，输赢只认已结算状态，未结算走 ELSE 0
fn stats_columns() -> String {
    format!(
        "COUNT(*) AS bet_count, \
         COALESCE(SUM(amount), 0) AS bet_amount, \
         COALESCE(SUM(CASE WHEN status = {won} THEN COALESCE(payout, 0) - amount \
                           WHEN status = {lost} THEN -amount \
                           ELSE 0 END), 0) AS win_loss",
        won = BetStatus::Won.get_code(),
        lost = BetStatus::Lost.get_code(),
    )
}

/// 注单统计服务，聚合都在 SQL 侧完成
pub struct BetStatsService {
    rb: Arc<RBatis>,
}

impl BetStatsService {
    pub fn new(rb: Arc<RBatis>) -> Self {
        Self { rb }
    }

    /// 一组会员的合计统计
    pub async fn stats_for_users(
        &self,
        user_ids: &[i64],
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> AppResult<BetStats> {
        if user_ids.is_empty() {
            return Ok(BetStats::default());
        }
        let placeholders = vec!["?"; user_ids.len()].join(",");
        let sql = format!(
            "SELECT {} FROM app_bet WHERE user_id IN ({}) AND create_time >= ? AND create_time < ?",
            stats_columns(),
            placeholders
        );
        let args = Self::args_with_range(user_ids, start, end);
        let row: StatsRow = self.rb.query_decode(&sql, args).await?;
        Ok(BetStats {
            bet_count: row.bet_count,
            bet_amount: row.bet_amount,
            valid_bet: row.bet_amount,
            win_loss: row.win_loss,
        })
    }

    /// 按会员分组统计（报表明细行），一条 GROUP BY 查询完成
    ///
    /// 区间内没有注单的会员不会出现在结果里，调用方补零。
    pub async fn stats_grouped_by_user(
        &self,
        user_ids: &[i64],
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> AppResult<HashMap<i64, BetStats>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; user_ids.len()].join(",");
        let sql = format!(
            "SELECT user_id, {} FROM app_bet \
             WHERE user_id IN ({}) AND create_time >= ? AND create_time < ? \
             GROUP BY user_id",
            stats_columns(),
            placeholders
        );
        let args = Self::args_with_range(user_ids, start, end);
        let rows: Vec<GroupedStatsRow> = self.rb.query_decode(&sql, args).await?;
        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.user_id,
                    BetStats {
                        bet_count: r.bet_count,
                        bet_amount: r.bet_amount,
                        valid_bet: r.bet_amount,
                        win_loss: r.win_loss,
                    },
                )
            })
            .collect())
    }

    fn args_with_range(
        user_ids: &[i64],
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> Vec<rbs::Value> {
        let mut args: Vec<rbs::Value> = user_ids.iter().map(|id| (*id).into()).collect();
        args.push(start.format(TIME_FMT).to_string().into());
        args.push(end.format(TIME_FMT).to_string().into());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_merge() {
        let mut total = BetStats {
            bet_count: 3,
            bet_amount: d("100"),
            valid_bet: d("100"),
            win_loss: d("-20"),
        };
        total.merge(&BetStats {
            bet_count: 2,
            bet_amount: d("50.5"),
            valid_bet: d("50.5"),
            win_loss: d("35"),
        });
        assert_eq!(total.bet_count, 5);
        assert_eq!(total.bet_amount, d("150.5"));
        assert_eq!(total.valid_bet, d("150.5"));
        assert_eq!(total.win_loss, d("15"));
    }

    #[test]
    fn test_merge_identity() {
        let mut stats = BetStats::default();
        stats.merge(&BetStats::default());
        assert_eq!(stats, BetStats::default());
        assert_eq!(stats.win_loss, Decimal::ZERO);
    }

    #[test]
    fn test_win_loss_counts_only_settled() {
        // 未结算注单不进输赢, 但 COUNT/SUM 不设状态条件, 照记注数和投注额
        let cols = stats_columns();
        assert!(cols.contains("WHEN status = 1 THEN COALESCE(payout, 0) - amount"));
        assert!(cols.contains("WHEN status = 2 THEN -amount"));
        assert!(cols.contains("ELSE 0 END"));
    }
}
