pub mod agent_service;
pub mod bet_stats_service;
pub mod commission;
pub mod downline_service;
pub mod ledger_service;
pub mod op_log;
pub mod permission;
pub mod report_service;
