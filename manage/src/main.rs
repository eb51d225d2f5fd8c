use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use common::config::{init_rbatis, test_connection, AppConfig, DbConfig};
use common::middleware::error_handler;
use common::middleware::SessionAuth;
use common::utils::redis_util::RedisUtil;

use crate::service::agent_service::AgentService;
use crate::service::bet_stats_service::BetStatsService;
use crate::service::downline_service::{DbDownlineSource, DownlineService};
use crate::service::ledger_service::LedgerService;
use crate::service::report_service::ReportService;

mod handle;
mod service;
mod state;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 嵌入配置文件（编译时加载）
    const DEFAULT_CONFIG: &str = include_str!("../config.toml");
    const PROD_CONFIG: &str = include_str!("../config.production.toml");

    let config = AppConfig::from_file_or_embedded("manage/config", DEFAULT_CONFIG, Some(PROD_CONFIG))
        .or_else(|_| AppConfig::from_env())
        .expect("配置加载失败");

    // 初始化日志（使用配置的日志级别）
    std::env::set_var("RUST_LOG", &config.log.level);
    common::init_logger();

    log::info!("启动代理后台服务...");
    log::info!("配置加载成功 - 数据库: {}", config.database.url);

    // 初始化数据库连接
    let db_config = DbConfig::new(
        config.database.url.clone(),
        config.database.max_connections as u64,
    );
    let rb = init_rbatis(&db_config).await.expect("数据库连接池初始化失败");
    if let Err(e) = test_connection(&rb).await {
        log::error!("数据库连接测试失败: {}", e);
    }
    let rb = Arc::new(rb);

    // 初始化 Redis 连接池
    log::info!("⚡ 初始化 Redis 连接池...");
    let redis_util = RedisUtil::from_url(config.redis.url.clone()).expect("初始化 Redis连接池失败");
    if let Err(e) = redis_util.ping().await {
        log::error!("Redis连接测试失败: {}", e);
    }
    let redis_util = Arc::new(redis_util);
    log::info!("📦 Redis 连接池已就绪");

    // 会话中间件（会话由认证服务写入, 这里只读并滑动续期）
    let session_auth = SessionAuth::new(redis_util.as_ref().clone());

    // 组装工程依赖
    let downline = Arc::new(DownlineService::new(Arc::new(DbDownlineSource::new(
        rb.clone(),
    ))));
    let stats = Arc::new(BetStatsService::new(rb.clone()));
    let agent_service = Arc::new(AgentService::new(rb.clone(), downline.clone()));
    let report_service = Arc::new(ReportService::new(rb.clone(), downline, stats));
    let ledger_service = Arc::new(LedgerService::new(rb.clone()));

    let state = state::AppState {
        rb,
        redis: redis_util,
        agent_service,
        report_service,
        ledger_service,
    };
    let state_data = web::Data::new(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("🚀 代理后台服务启动在: {}", addr);
    HttpServer::new(move || {
        App::new()
            // 全局中间件配置
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            // 会话校验中间件
            .wrap(session_auth.clone())
            // 注册 JSON、Query 和 Path 错误处理器
            .app_data(error_handler::json_config())
            .app_data(error_handler::query_config())
            .app_data(error_handler::path_config())
            // 注册全局数据
            .app_data(state_data.clone())
            // 总览
            .service(handle::report::dashboard)
            .service(handle::report::agent_report)
            .service(handle::report::member_report)
            // 下级管理
            .service(handle::agent::list_agents)
            .service(handle::agent::list_members)
            .service(handle::agent::create_agent)
            .service(handle::agent::create_member)
            .service(handle::agent::update_agent)
            // 用户状态与占成
            .service(handle::user::update_status)
            .service(handle::user::get_share_settings)
            .service(handle::user::update_share_settings)
            .service(handle::user::share_history)
            // 账务
            .service(handle::user::transactions)
            .service(handle::user::balance_transfer)
            .service(handle::user::withdraw_all)
    })
    .bind(&addr)?
    .run()
    .await
}
