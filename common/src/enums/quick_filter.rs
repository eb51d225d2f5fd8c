use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::models::dto::label::Label;

/// 报表快捷时间段枚举
///
/// 结算日以每天 12:00:00 为界（历史结算截点，沿用不改），一周从周日开始。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, AsRefStr)]
#[serde(rename_all = "camelCase")]
pub enum QuickFilter {
    /// 今天
    #[strum(to_string = "今天")]
    Today,
    /// 昨天
    #[strum(to_string = "昨天")]
    Yesterday,
    /// 本周
    #[strum(to_string = "本周")]
    ThisWeek,
    /// 上周
    #[strum(to_string = "上周")]
    LastWeek,
    /// 本月
    #[strum(to_string = "本月")]
    ThisMonth,
    /// 上月
    #[strum(to_string = "上月")]
    LastMonth,
}

/// 结算日锚点：当天 12:00:00
fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap()
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
    }
}

fn first_of_prev_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 1 {
        NaiveDate::from_ymd_opt(date.year() - 1, 12, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() - 1, 1).unwrap()
    }
}

impl QuickFilter {
    /// 按当前本地时间解析为 [start, end) 区间
    pub fn resolve(self) -> (NaiveDateTime, NaiveDateTime) {
        self.resolve_at(Local::now().naive_local())
    }

    /// 按给定时间解析为 [start, end) 区间
    pub fn resolve_at(self, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let today = now.date();
        match self {
            Self::Today => (noon(today), noon(today + Duration::days(1))),
            Self::Yesterday => (noon(today - Duration::days(1)), noon(today)),
            Self::ThisWeek => {
                // 周日为一周的第一天
                let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                (noon(week_start), noon(week_start + Duration::days(7)))
            }
            Self::LastWeek => {
                let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
                (noon(week_start - Duration::days(7)), noon(week_start))
            }
            Self::ThisMonth => {
                let month_start = first_of_month(today);
                (noon(month_start), noon(first_of_next_month(today)))
            }
            Self::LastMonth => {
                let month_start = first_of_month(today);
                (noon(first_of_prev_month(today)), noon(month_start))
            }
        }
    }

    /// 显式日期区间（起止日都含在内）解析为 [start, end)
    pub fn day_span(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (noon(start), noon(end + Duration::days(1)))
    }

    /// 前端参数名（camelCase）
    pub fn key(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "thisWeek",
            Self::LastWeek => "lastWeek",
            Self::ThisMonth => "thisMonth",
            Self::LastMonth => "lastMonth",
        }
    }

    /// 获取描述
    pub fn description(&self) -> String {
        self.as_ref().to_string()
    }

    /// 获取所有枚举的 Label 列表
    pub fn all_labels() -> Vec<Label<String, String>> {
        Self::iter()
            .map(|e| Label {
                value: e.key().to_string(),
                label: e.description(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_today_anchors_at_noon() {
        // 2024-05-15 是周三
        let (start, end) = QuickFilter::Today.resolve_at(at(2024, 5, 15, 15, 30));
        assert_eq!(start, at(2024, 5, 15, 12, 0));
        assert_eq!(end, at(2024, 5, 16, 12, 0));
    }

    #[test]
    fn test_yesterday() {
        let (start, end) = QuickFilter::Yesterday.resolve_at(at(2024, 5, 15, 9, 0));
        assert_eq!(start, at(2024, 5, 14, 12, 0));
        assert_eq!(end, at(2024, 5, 15, 12, 0));
    }

    #[test]
    fn test_this_week_starts_sunday() {
        // 2024-05-12 是周日
        let (start, end) = QuickFilter::ThisWeek.resolve_at(at(2024, 5, 15, 10, 0));
        assert_eq!(start, at(2024, 5, 12, 12, 0));
        assert_eq!(end, at(2024, 5, 19, 12, 0));
    }

    #[test]
    fn test_sunday_is_its_own_week_start() {
        let (start, _) = QuickFilter::ThisWeek.resolve_at(at(2024, 5, 12, 8, 0));
        assert_eq!(start, at(2024, 5, 12, 12, 0));
    }

    #[test]
    fn test_last_week() {
        let (start, end) = QuickFilter::LastWeek.resolve_at(at(2024, 5, 15, 10, 0));
        assert_eq!(start, at(2024, 5, 5, 12, 0));
        assert_eq!(end, at(2024, 5, 12, 12, 0));
    }

    #[test]
    fn test_this_month_year_rollover() {
        let (start, end) = QuickFilter::ThisMonth.resolve_at(at(2024, 12, 31, 23, 0));
        assert_eq!(start, at(2024, 12, 1, 12, 0));
        assert_eq!(end, at(2025, 1, 1, 12, 0));
    }

    #[test]
    fn test_last_month_january() {
        let (start, end) = QuickFilter::LastMonth.resolve_at(at(2025, 1, 10, 9, 0));
        assert_eq!(start, at(2024, 12, 1, 12, 0));
        assert_eq!(end, at(2025, 1, 1, 12, 0));
    }

    #[test]
    fn test_day_span_includes_end_day() {
        let (start, end) = QuickFilter::day_span(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        );
        assert_eq!(start, at(2024, 5, 1, 12, 0));
        assert_eq!(end, at(2024, 5, 4, 12, 0));
    }

    #[test]
    fn test_wire_keys() {
        assert_eq!(QuickFilter::ThisWeek.key(), "thisWeek");
        let json = serde_json::to_string(&QuickFilter::LastMonth).unwrap();
        assert_eq!(json, "\"lastMonth\"");
    }
}
