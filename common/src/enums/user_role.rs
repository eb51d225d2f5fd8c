use crate::models::dto::label::Label;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// 用户角色枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr)]
pub enum UserRole {
    /// 管理员 (0) - 平台运营方
    #[strum(to_string = "管理员")]
    Admin = 0,
    /// 代理 (1) - 可发展下级代理和会员
    #[strum(to_string = "代理")]
    Agent = 1,
    /// 会员 (2) - 下注玩家，树的叶子节点
    #[strum(to_string = "会员")]
    Member = 2,
}

impl UserRole {
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

    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn is_agent(self) -> bool {
        matches!(self, Self::Agent)
    }

    pub fn is_member(self) -> bool {
        matches!(self, Self::Member)
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
        assert_eq!(UserRole::from_code(0), Some(UserRole::Admin));
        assert_eq!(UserRole::from_code(1), Some(UserRole::Agent));
        assert_eq!(UserRole::from_code(2), Some(UserRole::Member));
        assert_eq!(UserRole::from_code(3), None);
    }

    #[test]
    fn test_role_predicates() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::Agent.is_agent());
        assert!(UserRole::Member.is_member());
        assert!(!UserRole::Member.is_agent());
    }
}
