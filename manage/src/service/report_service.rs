use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use common::constants::{LEVEL_TAG_DIRECT_MEMBERS, LEVEL_TAG_SUB_AGENTS, MEMBER_LEVEL};
use common::enums::{QuickFilter, UserRole};
use common::error::{AppError, AppResult};
use futures::future::try_join_all;
use orm::entities::AppUser;
use rbatis::RBatis;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::service::bet_stats_service::{BetStats, BetStatsService};
use crate::service::commission::commission;
use crate::service::downline_service::{DownlineMode, DownlineService};

const DATE_FMT: &str = "%Y-%m-%d";

type TimeRange = (NaiveDateTime, NaiveDateTime);

/// 报表查询参数
///
/// 显式 startDate/endDate 优先于 quickFilter；viewAgentId 用于
/// 下钻查看子树内某个节点，受查看域校验。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub quick_filter: Option<QuickFilter>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub keyword: Option<String>,
    pub view_agent_id: Option<i64>,
}

/// 报表行：身份 + 比例 + 投注统计 + 佣金结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub id: i64,
    pub username: Option<String>,
    pub nickname: Option<String>,
    /// 正常为节点层级；-1 直属会员汇总，-2 下级代理汇总
    pub agent_level: i32,
    pub share_percent: Decimal,
    pub rebate_percent: Decimal,
    pub bet_count: u64,
    pub bet_amount: Decimal,
    pub valid_bet: Decimal,
    pub member_win_loss: Decimal,
    pub member_rebate: Decimal,
    pub personal_share: Decimal,
    pub personal_rebate: Decimal,
    pub receivable: Decimal,
    pub payable: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbNode {
    pub id: i64,
    pub username: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVo {
    /// 汇总三行：全部会员 / 直属会员(-1) / 下级代理(-2)，都按目标节点自己的比例
    pub summary: Vec<ReportRow>,
    pub records: Vec<ReportRow>,
    pub breadcrumb: Vec<BreadcrumbNode>,
}

/// 工作台首页
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardVo {
    pub id: i64,
    pub account: Option<String>,
    pub nickname: Option<String>,
    pub agent_level: i32,
    pub balance: Decimal,
    pub agent_count: u64,
    pub member_count: u64,
    /// 今日全子树汇总行
    pub today: ReportRow,
}

/// 汇总块，子树会员集合与行明细共用，避免重复遍历
struct SummaryParts {
    rows: Vec<ReportRow>,
    subs: Vec<AppUser>,
    /// 与 subs 对齐，每个直属代理的子树会员ID
    sub_member_ids: Vec<Vec<i64>>,
}

/// 报表组装服务
pub struct ReportService {
    rb: Arc<RBatis>,
    downline: Arc<DownlineService>,
    stats: Arc<BetStatsService>,
}

impl ReportService {
    pub fn new(rb: Arc<RBatis>, downline: Arc<DownlineService>, stats: Arc<BetStatsService>) -> Self {
        Self { rb, downline, stats }
    }

    /// 代理报表：汇总三行 + 每个直属代理一行（按该代理自己的比例）
    pub async fn agent_report(&self, viewer: &AppUser, query: ReportQuery) -> AppResult<ReportVo> {
        let (x, range) = self.prepare(viewer, &query).await?;
        let parts = self.compose_summary(&x, &range).await?;

        // 关键字只过滤行明细, 不影响汇总
        let filtered: Vec<usize> = parts
            .subs
            .iter()
            .enumerate()
            .filter(|(_, s)| Self::matches_keyword(s, query.keyword.as_deref()))
            .map(|(i, _)| i)
            .collect();
        let row_stats = try_join_all(
            filtered
                .iter()
                .map(|i| self.stats.stats_for_users(&parts.sub_member_ids[*i], &range.0, &range.1)),
        )
        .await?;
        let records = filtered
            .iter()
            .zip(row_stats.iter())
            .map(|(i, stats)| {
                let s = &parts.subs[*i];
                Self::build_row(
                    s.id.unwrap_or_default(),
                    s.account.clone(),
                    s.nickname.clone(),
                    s.agent_level.unwrap_or_default(),
                    s.share_percent.unwrap_or_default(),
                    s.rebate_percent.unwrap_or_default(),
                    stats,
                )
            })
            .collect();

        let breadcrumb = self.breadcrumb_of(viewer, &x).await?;
        Ok(ReportVo {
            summary: parts.rows,
            records,
            breadcrumb,
        })
    }

    /// 会员报表：汇总三行 + 每个直属会员一行（按该会员自己的比例）
    pub async fn member_report(&self, viewer: &AppUser, query: ReportQuery) -> AppResult<ReportVo> {
        let (x, range) = self.prepare(viewer, &query).await?;
        let x_id = x.id.ok_or_else(|| AppError::internal("目标节点缺少ID"))?;
        let parts = self.compose_summary(&x, &range).await?;

        let members = self.direct_children_full(x_id, UserRole::Member).await?;
        let filtered: Vec<&AppUser> = members
            .iter()
            .filter(|m| Self::matches_keyword(m, query.keyword.as_deref()))
            .collect();
        let ids: Vec<i64> = filtered.iter().filter_map(|m| m.id).collect();
        // 一条 GROUP BY 拿齐全部行的统计, 区间内没有注单的补零
        let stats_map = self.stats.stats_grouped_by_user(&ids, &range.0, &range.1).await?;
        let records = filtered
            .into_iter()
            .map(|m| {
                let stats = m
                    .id
                    .and_then(|id| stats_map.get(&id).cloned())
                    .unwrap_or_default();
                Self::build_row(
                    m.id.unwrap_or_default(),
                    m.account.clone(),
                    m.nickname.clone(),
                    m.agent_level.unwrap_or(MEMBER_LEVEL),
                    m.share_percent.unwrap_or_default(),
                    m.rebate_percent.unwrap_or_default(),
                    &stats,
                )
            })
            .collect();

        let breadcrumb = self.breadcrumb_of(viewer, &x).await?;
        Ok(ReportVo {
            summary: parts.rows,
            records,
            breadcrumb,
        })
    }

    /// 工作台：本节点概况 + 今日全子树汇总
    pub async fn dashboard(&self, viewer: &AppUser) -> AppResult<DashboardVo> {
        let viewer_id = viewer.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let range = QuickFilter::Today.resolve();
        let member_ids = self.member_ids_under(viewer_id).await?;
        let stats = self
            .stats
            .stats_for_users(&member_ids, &range.0, &range.1)
            .await?;
        let today = Self::build_row(
            viewer_id,
            viewer.account.clone(),
            viewer.nickname.clone(),
            viewer.agent_level.unwrap_or_default(),
            viewer.share_percent.unwrap_or_default(),
            viewer.rebate_percent.unwrap_or_default(),
            &stats,
        );
        let counts = self.downline.direct_child_counts(&[viewer_id]).await?;
        let c = counts.get(&viewer_id).copied().unwrap_or_default();
        Ok(DashboardVo {
            id: viewer_id,
            account: viewer.account.clone(),
            nickname: viewer.nickname.clone(),
            agent_level: viewer.agent_level.unwrap_or_default(),
            balance: viewer.balance.unwrap_or_default(),
            agent_count: c.agents,
            member_count: c.members,
            today,
        })
    }

    /// 定位目标节点并解析时间范围；下钻节点必须在查看者子树内
    async fn prepare(&self, viewer: &AppUser, query: &ReportQuery) -> AppResult<(AppUser, TimeRange)> {
        let viewer_id = viewer.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let range = Self::resolve_range(query)?;
        let x = match query.view_agent_id {
            Some(target_id) if Some(target_id) != viewer.id => {
                if !viewer.is_admin() && !self.downline.is_in_subtree(viewer_id, target_id).await? {
                    return Err(AppError::forbidden("目标代理不在您的下级范围内"));
                }
                AppUser::select_by_id(self.rb.as_ref(), target_id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("用户 {} 不存在", target_id)))?
            }
            _ => viewer.clone(),
        };
        Ok((x, range))
    }

    /// 汇总三行
    ///
    /// 全部会员 = 直属会员 + 各直属代理子树会员（树上两块互斥，
    /// 并集即整棵子树），三块统计并发查询。
    async fn compose_summary(&self, x: &AppUser, range: &TimeRange) -> AppResult<SummaryParts> {
        let x_id = x.id.ok_or_else(|| AppError::internal("目标节点缺少ID"))?;
        let subs = self.direct_children_full(x_id, UserRole::Agent).await?;
        let sub_member_ids: Vec<Vec<i64>> = try_join_all(
            subs.iter()
                .map(|s| self.member_ids_under(s.id.unwrap_or_default())),
        )
        .await?;
        let direct_member_ids: Vec<i64> = self
            .downline
            .collect_descendants(x_id, DownlineMode::DirectMembers)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();

        let mut union: HashSet<i64> = HashSet::new();
        for ids in &sub_member_ids {
            union.extend(ids.iter().copied());
        }
        let sub_union: Vec<i64> = union.iter().copied().collect();
        let mut all = union;
        all.extend(direct_member_ids.iter().copied());
        let all_ids: Vec<i64> = all.into_iter().collect();

        let (total, direct, sub) = futures::try_join!(
            self.stats.stats_for_users(&all_ids, &range.0, &range.1),
            self.stats.stats_for_users(&direct_member_ids, &range.0, &range.1),
            self.stats.stats_for_users(&sub_union, &range.0, &range.1),
        )?;

        let share = x.share_percent.unwrap_or_default();
        let rebate = x.rebate_percent.unwrap_or_default();
        let rows = vec![
            Self::build_row(
                x_id,
                x.account.clone(),
                x.nickname.clone(),
                x.agent_level.unwrap_or_default(),
                share,
                rebate,
                &total,
            ),
            Self::build_row(
                x_id,
                x.account.clone(),
                x.nickname.clone(),
                LEVEL_TAG_DIRECT_MEMBERS,
                share,
                rebate,
                &direct,
            ),
            Self::build_row(
                x_id,
                x.account.clone(),
                x.nickname.clone(),
                LEVEL_TAG_SUB_AGENTS,
                share,
                rebate,
                &sub,
            ),
        ];
        Ok(SummaryParts {
            rows,
            subs,
            sub_member_ids,
        })
    }

    async fn member_ids_under(&self, agent_id: i64) -> AppResult<Vec<i64>> {
        Ok(self
            .downline
            .collect_descendants(agent_id, DownlineMode::AllMembers)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect())
    }

    async fn direct_children_full(&self, parent_id: i64, role: UserRole) -> AppResult<Vec<AppUser>> {
        let rows: Vec<AppUser> = self
            .rb
            .query_decode(
                "SELECT * FROM app_user WHERE parent_id = ? AND role = ? ORDER BY id",
                vec![parent_id.into(), role.get_code().into()],
            )
            .await?;
        Ok(rows)
    }

    async fn breadcrumb_of(&self, viewer: &AppUser, x: &AppUser) -> AppResult<Vec<BreadcrumbNode>> {
        let viewer_id = viewer.id.ok_or_else(|| AppError::internal("操作人缺少ID"))?;
        let x_id = x.id.ok_or_else(|| AppError::internal("目标节点缺少ID"))?;
        let path = self.downline.breadcrumb(viewer_id, x_id).await?;
        Ok(path
            .into_iter()
            .map(|n| BreadcrumbNode {
                id: n.id,
                username: n.account,
                nickname: n.nickname,
            })
            .collect())
    }

    /// 显式日期优先于快捷筛选，两者都缺省按今天
    fn resolve_range(query: &ReportQuery) -> AppResult<TimeRange> {
        match (query.start_date.as_deref(), query.end_date.as_deref()) {
            (Some(start), Some(end)) => {
                let start = NaiveDate::parse_from_str(start, DATE_FMT)
                    .map_err(|_| AppError::validation("日期格式应为 YYYY-MM-DD"))?;
                let end = NaiveDate::parse_from_str(end, DATE_FMT)
                    .map_err(|_| AppError::validation("日期格式应为 YYYY-MM-DD"))?;
                if start > end {
                    return Err(AppError::validation("开始日期不能晚于结束日期"));
                }
                Ok(QuickFilter::day_span(start, end))
            }
            (None, None) => Ok(query.quick_filter.unwrap_or(QuickFilter::Today).resolve()),
            _ => Err(AppError::validation("开始和结束日期需同时提供")),
        }
    }

    fn matches_keyword(user: &AppUser, keyword: Option<&str>) -> bool {
        let Some(kw) = keyword.map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let hit = |field: &Option<String>| field.as_deref().map_or(false, |v| v.contains(kw));
        hit(&user.account) || hit(&user.nickname)
    }

    fn build_row(
        id: i64,
        username: Option<String>,
        nickname: Option<String>,
        agent_level: i32,
        share_percent: Decimal,
        rebate_percent: Decimal,
        stats: &BetStats,
    ) -> ReportRow {
        let c = commission(stats.win_loss, stats.valid_bet, share_percent, rebate_percent);
        ReportRow {
            id,
            username,
            nickname,
            agent_level,
            share_percent,
            rebate_percent,
            bet_count: stats.bet_count,
            bet_amount: stats.bet_amount,
            valid_bet: stats.valid_bet,
            member_win_loss: stats.win_loss,
            member_rebate: c.member_rebate,
            personal_share: c.personal_share,
            personal_rebate: c.personal_rebate,
            receivable: c.receivable,
            payable: c.payable,
            profit: c.profit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn user(account: &str, nickname: &str) -> AppUser {
        AppUser {
            id: Some(1),
            account: Some(account.to_string()),
            nickname: Some(nickname.to_string()),
            password: None,
            role: Some(UserRole::Agent.get_code()),
            parent_id: None,
            agent_level: Some(2),
            balance: None,
            share_percent: None,
            rebate_percent: None,
            status: None,
            is_locked: None,
            is_full_disabled: None,
            is_readonly: None,
            invite_code: None,
            phone: None,
            remark: None,
            create_time: None,
            update_time: None,
            last_login_time: None,
        }
    }

    #[test]
    fn test_build_row_wires_commission() {
        // 会员净赢 200, 有效投注 1000, 占成 10%, 退水 5%
        let stats = BetStats {
            bet_count: 7,
            bet_amount: d("1000"),
            valid_bet: d("1000"),
            win_loss: d("200"),
        };
        let row = ReportService::build_row(
            3,
            Some("agt3".to_string()),
            Some("三级代理".to_string()),
            3,
            d("10"),
            d("5"),
            &stats,
        );
        assert_eq!(row.id, 3);
        assert_eq!(row.agent_level, 3);
        assert_eq!(row.bet_count, 7);
        assert_eq!(row.member_win_loss, d("200"));
        assert_eq!(row.member_rebate, d("50"));
        assert_eq!(row.personal_share, d("20"));
        assert_eq!(row.personal_rebate, d("50"));
        assert_eq!(row.receivable, d("0"));
        assert_eq!(row.payable, d("250"));
        assert_eq!(row.profit, d("-180"));
    }

    #[test]
    fn test_resolve_range_explicit_dates_override_quick_filter() {
        let query = ReportQuery {
            quick_filter: Some(QuickFilter::ThisMonth),
            start_date: Some("2024-05-10".to_string()),
            end_date: Some("2024-05-12".to_string()),
            ..Default::default()
        };
        let (start, end) = ReportService::resolve_range(&query).unwrap();
        // 结算日以 12:00 为界, 结束日也完整计入
        assert_eq!(start.to_string(), "2024-05-10 12:00:00");
        assert_eq!(end.to_string(), "2024-05-13 12:00:00");
    }

    #[test]
    fn test_resolve_range_rejects_reversed_dates() {
        let query = ReportQuery {
            start_date: Some("2024-05-12".to_string()),
            end_date: Some("2024-05-10".to_string()),
            ..Default::default()
        };
        let err = ReportService::resolve_range(&query).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_resolve_range_requires_both_dates() {
        let query = ReportQuery {
            start_date: Some("2024-05-12".to_string()),
            ..Default::default()
        };
        assert!(ReportService::resolve_range(&query).is_err());

        let query = ReportQuery {
            end_date: Some("2024-05-12".to_string()),
            ..Default::default()
        };
        assert!(ReportService::resolve_range(&query).is_err());
    }

    #[test]
    fn test_resolve_range_rejects_bad_format() {
        let query = ReportQuery {
            start_date: Some("2024/05/10".to_string()),
            end_date: Some("2024-05-12".to_string()),
            ..Default::default()
        };
        assert!(ReportService::resolve_range(&query).is_err());
    }

    #[test]
    fn test_resolve_range_defaults_to_today() {
        let (start, end) = ReportService::resolve_range(&ReportQuery::default()).unwrap();
        assert_eq!(end - start, Duration::days(1));
        assert_eq!(start.time().hour(), 12);
        assert_eq!(start.time().minute(), 0);
    }

    #[test]
    fn test_matches_keyword() {
        let u = user("agent007", "老王");
        assert!(ReportService::matches_keyword(&u, None));
        assert!(ReportService::matches_keyword(&u, Some("  ")));
        assert!(ReportService::matches_keyword(&u, Some("007")));
        assert!(ReportService::matches_keyword(&u, Some("老王")));
        assert!(!ReportService::matches_keyword(&u, Some("不存在")));
    }

    #[test]
    fn test_report_query_wire_format() {
        let q: ReportQuery = serde_json::from_str(
            r#"{"quickFilter":"thisWeek","viewAgentId":5,"keyword":"agt"}"#,
        )
        .unwrap();
        assert_eq!(q.quick_filter, Some(QuickFilter::ThisWeek));
        assert_eq!(q.view_agent_id, Some(5));
        assert_eq!(q.keyword.as_deref(), Some("agt"));
        assert!(q.start_date.is_none());
    }
}
