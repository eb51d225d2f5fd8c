// 根据用户ID生成邀请码

/// 打乱顺序的 35 进制字符表（去掉 0，0 用作补位符）
const SEED: [char; 35] = [
    'K', '3', 'W', 'A', 'E', '8', 'M', 'D', 'P', '2', 'H', 'V', '5', 'B', 'R',
    'N', '7', 'J', 'C', 'U', '4', 'T', 'F', 'Y', '1', 'G', 'X', '6', 'L', 'S',
    '9', 'Q', 'Z', 'I', 'O',
];

/// 根据 id 生成邀请码
///
/// 加偏移量后转 35 进制查表，同一 id 永远得到同一码，不同 id 不会相撞。
pub fn generate_for_id(id: i64) -> String {
    let mut num = id + 10000;
    let mut code = String::new();

    while num > 0 {
        let mod_val = num % 35;
        num = (num - mod_val) / 35;
        code.insert(0, SEED[mod_val as usize]);
    }

    while code.len() < 4 {
        code.insert(0, '0');
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_for_id_deterministic() {
        assert_eq!(generate_for_id(1), generate_for_id(1));
        assert_eq!(generate_for_id(1), "0P8X");
        assert_eq!(generate_for_id(100000), "WU69");
    }

    #[test]
    fn test_min_length_padded() {
        let code = generate_for_id(0);
        assert!(code.len() >= 4);
    }

    #[test]
    fn test_no_collisions_in_range() {
        let mut seen = HashSet::new();
        for id in 0..5000i64 {
            assert!(seen.insert(generate_for_id(id)), "collision at id {}", id);
        }
    }
}
