use crate::models::dto::label::Label;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// 账变类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr)]
pub enum AccountChangeType {
    /// 上分 (1) - 增加余额
    #[strum(to_string = "上分")]
    Deposit = 1,
    /// 下分 (-1) - 扣除余额
    #[strum(serialize = "下分", to_string = "下分")]
    Withdraw = -1,
    /// 派彩 (2) - 注单中奖，增加余额
    #[strum(to_string = "派彩")]
    BetWin = 2,
    /// 投注 (-2) - 下注扣除余额
    #[strum(serialize = "投注", to_string = "投注")]
    BetPlace = -2,
    /// 撤单返还 (3) - 注单作废，返还本金
    #[strum(to_string = "撤单返还")]
    BetRefund = 3,
    /// 人工加款 (5)
    #[strum(to_string = "人工加款")]
    AdjustAdd = 5,
    /// 人工扣款 (-5)
    #[strum(serialize = "人工扣款", to_string = "人工扣款")]
    AdjustSub = -5,
}

impl AccountChangeType {
    /// 转换为 i32 值
    pub fn get_code(self) -> i32 {
        self as i32
    }

    /// 从 i32 值转换
    pub fn from_code(value: i32) -> Option<Self> {
        for e in Self::iter() {
            if e.get_code() == value {
                return Some(e);
            }
        }
        None
    }

    /// 资金方向：入账 +1，出账 -1（由类型本身决定，调用方不可指定）
    pub fn sign(self) -> i32 {
        if self.get_code() > 0 {
            1
        } else {
            -1
        }
    }

    /// 获取描述
    pub fn description(&self) -> String {
        self.as_ref().to_string()
    }

    /// 获取所有枚举的 Label 列表
    pub fn all_labels() -> Vec<Label<i32, String>> {
        Self::iter()
            .map(|e| Label {
                value: e.get_code(),
                label: e.description(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for e in AccountChangeType::iter() {
            assert_eq!(AccountChangeType::from_code(e.get_code()), Some(e));
        }
        assert_eq!(AccountChangeType::from_code(99), None);
    }

    #[test]
    fn test_sign_matches_code() {
        // 入账类型码为正，出账类型码为负
        assert_eq!(AccountChangeType::Deposit.sign(), 1);
        assert_eq!(AccountChangeType::Withdraw.sign(), -1);
        assert_eq!(AccountChangeType::BetWin.sign(), 1);
        assert_eq!(AccountChangeType::BetPlace.sign(), -1);
        assert_eq!(AccountChangeType::BetRefund.sign(), 1);
        assert_eq!(AccountChangeType::AdjustAdd.sign(), 1);
        assert_eq!(AccountChangeType::AdjustSub.sign(), -1);
    }

    #[test]
    fn test_description() {
        assert_eq!(AccountChangeType::Deposit.description(), "上分");
        assert_eq!(AccountChangeType::Withdraw.description(), "下分");
        assert_eq!(AccountChangeType::BetWin.description(), "派彩");
    }

    #[test]
    fn test_all_labels() {
        let labels = AccountChangeType::all_labels();
        assert_eq!(labels.len(), 7);
        assert!(labels.iter().any(|l| l.value == 1 && l.label == "上分"));
        assert!(labels.iter().any(|l| l.value == -1 && l.label == "下分"));
    }
}
