use actix_web::web;
use sea_orm::DatabaseConnection;

use crate::handlers;
use crate::raffle::TicketLedger;
use crate::services::{AuthService, ProfileService, RaffleService, RoundService};
use crate::utils::JwtService;

/// 应用层共享的服务集合
#[derive(Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub profile: ProfileService,
    pub round: RoundService,
    pub raffle: RaffleService,
}

impl AppServices {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, ledger: TicketLedger) -> Self {
        Self {
            auth: AuthService::new(pool.clone(), jwt_service),
            profile: ProfileService::new(pool.clone(), ledger),
            round: RoundService::new(pool.clone()),
            raffle: RaffleService::new(pool, ledger),
        }
    }
}

/// 注册服务数据与 `/api/v1` 下的全部路由
pub fn configure(services: AppServices) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(services.auth))
            .app_data(web::Data::new(services.profile))
            .app_data(web::Data::new(services.round))
            .app_data(web::Data::new(services.raffle))
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::profile_config)
                    .configure(handlers::raffle_config)
                    .configure(handlers::admin_config),
            );
    }
}
