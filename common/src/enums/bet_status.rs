use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// 注单状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr)]
pub enum BetStatus {
    /// 未结算 (0)
    #[strum(to_string = "未结算")]
    Pending = 0,
    /// 已中奖 (1)
    #[strum(to_string = "已中奖")]
    Won = 1,
    /// 未中奖 (2)
    #[strum(to_string = "未中奖")]
    Lost = 2,
}

impl BetStatus {
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

    /// 是否已结算
    pub fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// 获取描述
    pub fn description(&self) -> String {
        self.as_ref().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for e in BetStatus::iter() {
            assert_eq!(BetStatus::from_code(e.get_code()), Some(e));
        }
        assert_eq!(BetStatus::from_code(7), None);
    }

    #[test]
    fn test_is_settled() {
        assert!(!BetStatus::Pending.is_settled());
        assert!(BetStatus::Won.is_settled());
        assert!(BetStatus::Lost.is_settled());
    }
}
