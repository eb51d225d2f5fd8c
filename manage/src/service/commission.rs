use common::utils::money_util::{percent_of, round2};
use rust_decimal::Decimal;
use serde::Serialize;

/// 一个节点在一段报表周期内的佣金结算各项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionResult {
    /// 会员退水 = 有效投注 * 退水比例
    pub member_rebate: Decimal,
    /// 个人占成 = |会员输赢| * 占成比例
    pub personal_share: Decimal,
    /// 个人退水，与会员退水同额
    pub personal_rebate: Decimal,
    /// 应收，会员净输时向下线收取
    pub receivable: Decimal,
    /// 应付，会员净赢的派彩加退水
    pub payable: Decimal,
    /// 利润 = 应收 - 应付 + 个人占成 + 个人退水
    pub profit: Decimal,
}

/// 佣金公式
///
/// `win_loss` 以会员视角带符号：正数表示会员赢（代理要往下付），
/// 负数表示会员输（代理向下收）。占成/退水按绝对值计，与方向无关。
/// 纯函数，相同输入恒得相同输出。
pub fn commission(
    win_loss: Decimal,
    valid_bet: Decimal,
    share_percent: Decimal,
    rebate_percent: Decimal,
) -> CommissionResult {
    let member_rebate = percent_of(valid_bet, rebate_percent);
    let personal_share = round2(win_loss.abs() * share_percent / Decimal::from(100));
    let personal_rebate = member_rebate;

    let receivable = if win_loss < Decimal::ZERO {
        win_loss.abs()
    } else {
        Decimal::ZERO
    };
    // 会员净赢时退水照付，净输时 payable 只剩退水一项
    let payable = if win_loss > Decimal::ZERO {
        win_loss + member_rebate
    } else {
        member_rebate
    };
    let profit = receivable - payable + personal_share + personal_rebate;

    CommissionResult {
        member_rebate,
        personal_share,
        personal_rebate,
        receivable,
        payable,
        profit,
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
    fn test_member_net_win() {
        // 占成 10%, 退水 5%, 有效投注 1000, 会员净赢 200
        let r = commission(d("200"), d("1000"), d("10"), d("5"));
        assert_eq!(r.member_rebate, d("50.00"));
        assert_eq!(r.personal_share, d("20.00"));
        assert_eq!(r.personal_rebate, d("50.00"));
        assert_eq!(r.receivable, d("0"));
        assert_eq!(r.payable, d("250.00"));
        assert_eq!(r.profit, d("-180.00"));
    }

    #[test]
    fn test_member_net_loss() {
        // 同一代理, 会员净输 300
        let r = commission(d("-300"), d("1000"), d("10"), d("5"));
        assert_eq!(r.member_rebate, d("50.00"));
        assert_eq!(r.personal_share, d("30.00"));
        assert_eq!(r.receivable, d("300"));
        assert_eq!(r.payable, d("50.00"));
        assert_eq!(r.profit, d("330.00"));
    }

    #[test]
    fn test_zero_activity() {
        let r = commission(d("0"), d("0"), d("35"), d("8"));
        assert_eq!(r.member_rebate, d("0.00"));
        assert_eq!(r.personal_share, d("0.00"));
        assert_eq!(r.receivable, d("0"));
        assert_eq!(r.payable, d("0.00"));
        assert_eq!(r.profit, d("0.00"));
    }

    #[test]
    fn test_deterministic() {
        let a = commission(d("123.45"), d("6789.01"), d("12.5"), d("3.3"));
        let b = commission(d("123.45"), d("6789.01"), d("12.5"), d("3.3"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_receivable_payable_mutually_exclusive() {
        for win_loss in ["-500", "-0.01", "0", "0.01", "500"] {
            let r = commission(d(win_loss), d("1000"), d("15"), d("5"));
            if r.receivable > Decimal::ZERO {
                // 会员输钱: 应付只剩退水
                assert_eq!(r.payable, r.member_rebate);
            }
            if r.payable > r.member_rebate {
                // 会员赢钱: 无应收
                assert_eq!(r.receivable, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_banker_rounding_on_percentages() {
        // 1234.5 * 1% = 12.345 -> 五成双 12.34
        let r = commission(d("0"), d("1234.5"), d("0"), d("1"));
        assert_eq!(r.member_rebate, d("12.34"));

        // 50.5 * 7% = 3.535 -> 3.54
        let r = commission(d("-50.5"), d("0"), d("7"), d("0"));
        assert_eq!(r.personal_share, d("3.54"));
    }
}
