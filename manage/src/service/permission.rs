use common::enums::UserRole;

/// 变更类操作（状态、占成退水、转账）只允许管理员或直属上级，
/// 查看类操作走下线树判断，不在这里。
pub fn can_mutate(operator_id: i64, operator_role: UserRole, target_parent_id: i64) -> bool {
    if operator_role.is_admin() {
        return true;
    }
    operator_id == target_parent_id
}

/// 资料编辑额外放开本人
pub fn can_edit_profile(
    operator_id: i64,
    operator_role: UserRole,
    target_id: i64,
    target_parent_id: i64,
) -> bool {
    if operator_id == target_id {
        return true;
    }
    can_mutate(operator_id, operator_role, target_parent_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 树: 1(管理员) -> 2(代理) -> 3(代理) -> 4(会员)

    #[test]
    fn test_admin_mutates_anyone() {
        assert!(can_mutate(1, UserRole::Admin, 2));
        assert!(can_mutate(1, UserRole::Admin, 3));
    }

    #[test]
    fn test_direct_parent_mutates_child() {
        assert!(can_mutate(2, UserRole::Agent, 2));
        assert!(can_mutate(3, UserRole::Agent, 3));
    }

    #[test]
    fn test_grandparent_cannot_mutate() {
        // 2 是 4 的上上级, 4 的直属上级是 3
        assert!(!can_mutate(2, UserRole::Agent, 3));
    }

    #[test]
    fn test_sibling_and_stranger_denied() {
        assert!(!can_mutate(7, UserRole::Agent, 3));
        assert!(!can_mutate(4, UserRole::Member, 3));
    }

    #[test]
    fn test_profile_self_edit_allowed() {
        assert!(can_edit_profile(4, UserRole::Member, 4, 3));
        assert!(can_edit_profile(3, UserRole::Agent, 4, 3));
        assert!(!can_edit_profile(2, UserRole::Agent, 4, 3));
    }
}
