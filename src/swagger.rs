use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;
use crate::raffle::{RoundStatus, TicketSummary};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::profile::get_profile,
        handlers::profile::get_points_history,
        handlers::raffle::win_index,
        handlers::raffle::add_ticket,
        handlers::raffle::remove_ticket,
        handlers::admin::list_rounds,
        handlers::admin::create_round,
        handlers::admin::update_round,
        handlers::admin::list_prizes,
        handlers::admin::create_prize,
        handlers::admin::draw_winner,
        handlers::admin::award_points,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UserResponse,
            AuthResponse,
            ProfileResponse,
            AwardPointsRequest,
            PointsTransactionResponse,
            CreateRoundRequest,
            UpdateRoundRequest,
            RoundResponse,
            RoundStatus,
            TicketSummary,
            CreatePrizeRequest,
            PrizeListQuery,
            RafflePrizeResponse,
            DrawResultResponse,
            RaffleRoundInfo,
            RafflePrizeEntry,
            RafflePageResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "profile", description = "Points and ticket overview API"),
        (name = "raffle", description = "Raffle page and ticket allocation API"),
        (name = "admin", description = "Round, prize and points administration API"),
    ),
    info(
        title = "Raffle Backend API",
        version = "1.0.0",
        description = "Raffle Backend REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_raffle_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/win"));
        assert!(paths.iter().any(|p| p.as_str() == "/win/raffle/{prize_id}/add"));
        assert!(paths.iter().any(|p| p.as_str() == "/admin/prizes/{prize_id}/draw"));
        assert!(doc.components.is_some());
    }
}
