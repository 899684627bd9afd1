use actix_web::{App, HttpServer, middleware::Logger};
use anyhow::Context;
use chrono::Local; // 日志时间戳
use env_logger::{Env, Target};
use std::io::Write; // env_logger 自定义格式

use raffle_backend::{
    app::{self, AppServices},
    config::Config,
    database::{create_pool, run_migrations},
    middlewares::{AuthMiddleware, create_cors},
    raffle::TicketLedger,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to load configuration file")?;

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let ledger = TicketLedger::new(config.raffle.points_per_ticket);
    log::info!(
        "Raffle ledger: {} points per ticket",
        ledger.points_per_ticket()
    );

    // 创建服务
    let services = AppServices::new(pool.clone(), jwt_service.clone(), ledger);

    if let Some(admin) = &config.admin {
        let user = services
            .auth
            .ensure_admin(&admin.username, &admin.password)
            .await
            .context("Failed to provision admin account")?;
        log::info!("Admin account ready: {}", user.username);
    }

    // 启动后台任务
    tasks::spawn_all(services.round.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .configure(swagger_config)
            .configure(app::configure(services.clone()))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
