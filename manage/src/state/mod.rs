use std::sync::Arc;

use common::utils::redis_util::RedisUtil;
use rbatis::RBatis;

use crate::service::agent_service::AgentService;
use crate::service::ledger_service::LedgerService;
use crate::service::report_service::ReportService;

#[derive(Clone)]
#[allow(dead_code)]
pub struct AppState {
    pub rb: Arc<RBatis>,
    pub redis: Arc<RedisUtil>,
    pub agent_service: Arc<AgentService>,
    pub report_service: Arc<ReportService>,
    pub ledger_service: Arc<LedgerService>,
}
