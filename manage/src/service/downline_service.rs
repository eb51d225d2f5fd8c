use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::enums::UserRole;
use common::error::AppResult;
use rbatis::RBatis;
use serde::{Deserialize, Serialize};

/// 树遍历所需的最小节点信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeBrief {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub role: i32,
    pub account: Option<String>,
    pub nickname: Option<String>,
}

/// 下级树数据源抽象，遍历逻辑不直接面向 MySQL，便于用内存树做测试
#[async_trait]
pub trait DownlineSource: Send + Sync {
    /// 批量取一组节点的全部直接子节点
    async fn fetch_children(&self, parent_ids: &[i64]) -> AppResult<Vec<NodeBrief>>;
    /// 取单个节点
    async fn fetch_brief(&self, id: i64) -> AppResult<Option<NodeBrief>>;
}

/// MySQL 数据源：每一层只发一条 parent_id IN (...) 查询，
/// 往返次数与树深同阶而不是与节点数同阶
pub struct DbDownlineSource {
    rb: Arc<RBatis>,
}

impl DbDownlineSource {
    pub fn new(rb: Arc<RBatis>) -> Self {
        Self { rb }
    }
}

#[async_trait]
impl DownlineSource for DbDownlineSource {
    async fn fetch_children(&self, parent_ids: &[i64]) -> AppResult<Vec<NodeBrief>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; parent_ids.len()].join(",");
        let sql = format!(
            "SELECT id, parent_id, role, account, nickname FROM app_user WHERE parent_id IN ({})",
            placeholders
        );
        let args: Vec<rbs::Value> = parent_ids.iter().map(|id| (*id).into()).collect();
        let rows: Vec<NodeBrief> = self.rb.query_decode(&sql, args).await?;
        Ok(rows)
    }

    async fn fetch_brief(&self, id: i64) -> AppResult<Option<NodeBrief>> {
        let row: Option<NodeBrief> = self
            .rb
            .query_decode(
                "SELECT id, parent_id, role, account, nickname FROM app_user WHERE id = ? LIMIT 1",
                vec![id.into()],
            )
            .await?;
        Ok(row)
    }
}

/// 后代收集模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlineMode {
    /// 整棵子树内的会员
    AllMembers,
    /// 仅直属会员
    DirectMembers,
    /// 仅直属代理
    DirectSubAgents,
}

/// 一个节点的直属下级数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildCounts {
    pub agents: u64,
    pub members: u64,
}

/// 代理树遍历服务
pub struct DownlineService {
    source: Arc<dyn DownlineSource>,
}

impl DownlineService {
    pub fn new(source: Arc<dyn DownlineSource>) -> Self {
        Self { source }
    }

    /// 收集 root 下的后代节点
    ///
    /// 全树模式按层 BFS，visited 集合保证脏数据成环时也能终止，
    /// 结果无重复。root 自身不在结果内。
    pub async fn collect_descendants(
        &self,
        root_id: i64,
        mode: DownlineMode,
    ) -> AppResult<Vec<NodeBrief>> {
        match mode {
            DownlineMode::DirectMembers => self.direct_children(root_id, UserRole::Member).await,
            DownlineMode::DirectSubAgents => self.direct_children(root_id, UserRole::Agent).await,
            DownlineMode::AllMembers => {
                let want = UserRole::Member.get_code();

                let mut visited: HashSet<i64> = HashSet::from([root_id]);
                let mut collected = Vec::new();
                let mut frontier = vec![root_id];

                while !frontier.is_empty() {
                    let children = self.source.fetch_children(&frontier).await?;
                    frontier = Vec::new();
                    for child in children {
                        if !visited.insert(child.id) {
                            continue;
                        }
                        // 只有代理节点会有下级
                        if child.role == UserRole::Agent.get_code() {
                            frontier.push(child.id);
                        }
                        if child.role == want {
                            collected.push(child);
                        }
                    }
                }
                Ok(collected)
            }
        }
    }

    async fn direct_children(&self, parent_id: i64, role: UserRole) -> AppResult<Vec<NodeBrief>> {
        let children = self.source.fetch_children(&[parent_id]).await?;
        Ok(children
            .into_iter()
            .filter(|n| n.role == role.get_code())
            .collect())
    }

    /// target 是否在 root 的子树内（含 root 自身）
    ///
    /// 沿 parent_id 向上走而不是向下展开，代价与树深同阶。
    pub async fn is_in_subtree(&self, root_id: i64, target_id: i64) -> AppResult<bool> {
        if root_id == target_id {
            return Ok(true);
        }
        let mut seen: HashSet<i64> = HashSet::from([target_id]);
        let mut cursor = target_id;
        while let Some(node) = self.source.fetch_brief(cursor).await? {
            match node.parent_id {
                Some(pid) if pid == root_id => return Ok(true),
                Some(pid) => {
                    if !seen.insert(pid) {
                        // 脏数据成环
                        return Ok(false);
                    }
                    cursor = pid;
                }
                None => return Ok(false),
            }
        }
        Ok(false)
    }

    /// 从 requester 到 target 的导航路径（两端都含），requester 在前
    ///
    /// 仅用于界面导航，访问权限由 is_in_subtree 单独判定。
    pub async fn breadcrumb(
        &self,
        requester_id: i64,
        target_id: i64,
    ) -> AppResult<Vec<NodeBrief>> {
        let mut path = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        let mut cursor = Some(target_id);

        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            let Some(node) = self.source.fetch_brief(id).await? else {
                break;
            };
            let parent = node.parent_id;
            let reached_requester = node.id == requester_id;
            path.push(node);
            if reached_requester {
                break;
            }
            cursor = parent;
        }

        path.reverse();
        Ok(path)
    }

    /// 一批节点各自的直属代理数/会员数（列表页展示用），一条查询完成
    pub async fn direct_child_counts(
        &self,
        ids: &[i64],
    ) -> AppResult<HashMap<i64, ChildCounts>> {
        let mut counts: HashMap<i64, ChildCounts> =
            ids.iter().map(|id| (*id, ChildCounts::default())).collect();
        if ids.is_empty() {
            return Ok(counts);
        }
        for child in self.source.fetch_children(ids).await? {
            let Some(pid) = child.parent_id else { continue };
            let Some(entry) = counts.get_mut(&pid) else {
                continue;
            };
            if child.role == UserRole::Agent.get_code() {
                entry.agents += 1;
            } else if child.role == UserRole::Member.get_code() {
                entry.members += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 内存树数据源
    struct MemSource {
        nodes: HashMap<i64, NodeBrief>,
    }

    impl MemSource {
        fn new(rows: &[(i64, Option<i64>, UserRole)]) -> Self {
            let nodes = rows
                .iter()
                .map(|(id, parent_id, role)| {
                    (
                        *id,
                        NodeBrief {
                            id: *id,
                            parent_id: *parent_id,
                            role: role.get_code(),
                            account: Some(format!("u{}", id)),
                            nickname: Some(format!("昵称{}", id)),
                        },
                    )
                })
                .collect();
            Self { nodes }
        }
    }

    #[async_trait]
    impl DownlineSource for MemSource {
        async fn fetch_children(&self, parent_ids: &[i64]) -> AppResult<Vec<NodeBrief>> {
            let mut out: Vec<NodeBrief> = self
                .nodes
                .values()
                .filter(|n| n.parent_id.map_or(false, |p| parent_ids.contains(&p)))
                .cloned()
                .collect();
            out.sort_by_key(|n| n.id);
            Ok(out)
        }

        async fn fetch_brief(&self, id: i64) -> AppResult<Option<NodeBrief>> {
            Ok(self.nodes.get(&id).cloned())
        }
    }

    /// 管理员1 -> 代理2 -> 代理3 -> 会员4,5
    ///              |
    ///              +-> 会员6;  代理7 (管理员直属) -> 会员8
    fn sample_service() -> DownlineService {
        use UserRole::*;
        DownlineService::new(Arc::new(MemSource::new(&[
            (1, None, Admin),
            (2, Some(1), Agent),
            (3, Some(2), Agent),
            (4, Some(3), Member),
            (5, Some(3), Member),
            (6, Some(2), Member),
            (7, Some(1), Agent),
            (8, Some(7), Member),
        ])))
    }

    fn ids(nodes: &[NodeBrief]) -> Vec<i64> {
        let mut v: Vec<i64> = nodes.iter().map(|n| n.id).collect();
        v.sort_unstable();
        v
    }

    #[tokio::test]
    async fn test_collect_all_members() {
        let svc = sample_service();
        let members = svc
            .collect_descendants(2, DownlineMode::AllMembers)
            .await
            .unwrap();
        assert_eq!(ids(&members), vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn test_direct_modes_are_single_level() {
        let svc = sample_service();
        let members = svc
            .collect_descendants(2, DownlineMode::DirectMembers)
            .await
            .unwrap();
        assert_eq!(ids(&members), vec![6]);

        let agents = svc
            .collect_descendants(2, DownlineMode::DirectSubAgents)
            .await
            .unwrap();
        assert_eq!(ids(&agents), vec![3]);
    }

    #[tokio::test]
    async fn test_terminates_on_corrupted_cycle() {
        use UserRole::*;
        // 2 和 3 互为上级的脏数据
        let svc = DownlineService::new(Arc::new(MemSource::new(&[
            (2, Some(3), Agent),
            (3, Some(2), Agent),
            (4, Some(3), Member),
        ])));
        let members = svc
            .collect_descendants(2, DownlineMode::AllMembers)
            .await
            .unwrap();
        assert_eq!(ids(&members), vec![4]);

        // 向上走同样不能死循环
        assert!(!svc.is_in_subtree(99, 4).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_in_subtree() {
        let svc = sample_service();
        assert!(svc.is_in_subtree(2, 2).await.unwrap());
        assert!(svc.is_in_subtree(2, 4).await.unwrap());
        assert!(svc.is_in_subtree(1, 5).await.unwrap());
        // 兄弟分支不可见
        assert!(!svc.is_in_subtree(2, 8).await.unwrap());
        // 反方向不成立
        assert!(!svc.is_in_subtree(4, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_breadcrumb_order() {
        let svc = sample_service();
        let path = svc.breadcrumb(2, 5).await.unwrap();
        assert_eq!(path.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3, 5]);

        let self_path = svc.breadcrumb(2, 2).await.unwrap();
        assert_eq!(self_path.len(), 1);
        assert_eq!(self_path[0].id, 2);
    }

    #[tokio::test]
    async fn test_direct_child_counts() {
        let svc = sample_service();
        let counts = svc.direct_child_counts(&[2, 3, 7]).await.unwrap();
        assert_eq!(counts[&2], ChildCounts { agents: 1, members: 1 });
        assert_eq!(counts[&3], ChildCounts { agents: 0, members: 2 });
        assert_eq!(counts[&7], ChildCounts { agents: 0, members: 1 });
    }
}
