use rust_decimal::{Decimal, RoundingStrategy};

/// 金额保留两位小数，银行家舍入（四舍六入五成双）
pub fn round2(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// 百分比取值: base * percent / 100，保留两位小数
pub fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    round2(base * percent / Decimal::from(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_banker() {
        // 五成双：.345 -> .34, .355 -> .36
        assert_eq!(round2(d("2.345")), d("2.34"));
        assert_eq!(round2(d("2.355")), d("2.36"));
        assert_eq!(round2(d("-2.345")), d("-2.34"));
        assert_eq!(round2(d("1.234")), d("1.23"));
        assert_eq!(round2(d("1.236")), d("1.24"));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(d("1000"), d("5")), d("50.00"));
        assert_eq!(percent_of(d("200"), d("10")), d("20.00"));
        assert_eq!(percent_of(d("0"), d("35")), d("0.00"));
    }
}
