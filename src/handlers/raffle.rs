use crate::error::{AppError, AppResult};
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RaffleService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

/// 把页面数据中的操作解析为具名路由 URL
fn render_page(req: &HttpRequest, view: RafflePageView) -> AppResult<RafflePageResponse> {
    RafflePageResponse::from_view(view, |action, prize_id| {
        req.url_for(action.route_name(), [prize_id.to_string()])
            .map(|url| url.path().to_string())
            .map_err(|e| AppError::InternalError(format!("URL generation failed: {e:?}")))
    })
}

fn respond(req: &HttpRequest, view: AppResult<RafflePageView>) -> HttpResponse {
    match view.and_then(|v| render_page(req, v)) {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    get,
    path = "/win",
    tag = "raffle",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "抽奖页面", body = RafflePageResponse),
        (status = 401, description = "未授权")
    )
)]
/// 当前轮次的抽奖页面：券数统计、可见奖品及可用操作
pub async fn win_index(service: web::Data<RaffleService>, req: HttpRequest) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let view = service.page(user.id, Utc::now()).await;
    Ok(respond(&req, view))
}

#[utoipa::path(
    post,
    path = "/win/raffle/{prize_id}/add",
    tag = "raffle",
    params(
        ("prize_id" = i32, Path, description = "奖品ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "追加一张券（条件不满足时不变），返回最新页面", body = RafflePageResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn add_ticket(
    service: web::Data<RaffleService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let view = service
        .add_ticket(user.id, path.into_inner(), Utc::now())
        .await;
    Ok(respond(&req, view))
}

#[utoipa::path(
    post,
    path = "/win/raffle/{prize_id}/remove",
    tag = "raffle",
    params(
        ("prize_id" = i32, Path, description = "奖品ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "撤回一张券（没有可撤回时不变），返回最新页面", body = RafflePageResponse),
        (status = 401, description = "未授权"),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn remove_ticket(
    service: web::Data<RaffleService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let view = service
        .remove_ticket(user.id, path.into_inner(), Utc::now())
        .await;
    Ok(respond(&req, view))
}

/// 路由配置（具名路由用于生成操作链接）
pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/win")
            .service(
                web::resource("")
                    .name("win_index")
                    .route(web::get().to(win_index)),
            )
            .service(
                web::resource("/raffle/{prize_id}/add")
                    .name("raffle_add_ticket")
                    .route(web::post().to(add_ticket)),
            )
            .service(
                web::resource("/raffle/{prize_id}/remove")
                    .name("raffle_remove_ticket")
                    .route(web::post().to(remove_ticket)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::middlewares::AuthMiddleware;
    use crate::models::{RAFFLE_NOT_STARTED_MESSAGE, RAFFLE_OVER_MESSAGE};
    use crate::test_support::TestContext;
    use actix_web::{App, http::StatusCode, test};
    use chrono::Utc;
    use serde_json::Value;

    macro_rules! init_app {
        ($ctx:expr) => {
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($ctx.jwt.clone()))
                    .configure(app::configure($ctx.services.clone())),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_win_index_shows_current_round() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 0).await;
        ctx.add_prize("Old prize", "Round 1").await;
        let prize = ctx.add_prize("New prize", "Round 2").await;
        let app = init_app!(ctx);

        let req = test::TestRequest::get()
            .uri("/api/v1/win")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(data["title"], "Round 2 Raffle");
        assert_eq!(data["round"]["status"], "current");
        assert_eq!(
            data["summary"],
            "Your total raffle tickets: 0 Allocated right now: 0 Available: 0"
        );
        assert_eq!(data["is_over"], false);
        assert!(data["message"].is_null());
        let prizes = data["prizes"].as_array().unwrap();
        assert_eq!(prizes.len(), 1);
        assert_eq!(prizes[0]["id"], prize.id);
        assert!(prizes[0]["add_ticket_url"].is_null());
        assert!(prizes[0]["remove_ticket_url"].is_null());
    }

    #[actix_web::test]
    async fn test_win_index_before_any_round() {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("alice", false, 25).await;
        let app = init_app!(ctx);

        let req = test::TestRequest::get()
            .uri("/api/v1/win")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["round"].is_null());
        assert_eq!(body["data"]["message"], RAFFLE_NOT_STARTED_MESSAGE);
        assert_eq!(body["data"]["tickets"]["total"], 1);
    }

    #[actix_web::test]
    async fn test_add_ticket() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let prize = ctx.add_prize("New prize", "Round 2").await;
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/win/raffle/{}/add", prize.id))
            .insert_header(ctx.bearer(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(ctx.held(user.id, prize.id).await, 1);

        let body: Value = test::read_body_json(resp).await;
        let data = &body["data"];
        assert_eq!(
            data["summary"],
            "Your total raffle tickets: 2 Allocated right now: 1 Available: 1"
        );
        let entry = &data["prizes"][0];
        assert_eq!(entry["allocated"], 1);
        assert_eq!(
            entry["add_ticket_url"],
            format!("/api/v1/win/raffle/{}/add", prize.id)
        );
        assert_eq!(
            entry["remove_ticket_url"],
            format!("/api/v1/win/raffle/{}/remove", prize.id)
        );
    }

    #[actix_web::test]
    async fn test_add_ticket_without_available_ticket() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 25).await;
        let prize = ctx.add_prize("New prize", "Round 2").await;
        ctx.allocate(user.id, prize.id, 1).await;
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/win/raffle/{}/add", prize.id))
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ctx.held(user.id, prize.id).await, 1);
        assert_eq!(body["data"]["tickets"]["available"], 0);
        assert!(body["data"]["prizes"][0]["add_ticket_url"].is_null());
    }

    #[actix_web::test]
    async fn test_remove_ticket() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let prize = ctx.add_prize("New prize", "Round 2").await;
        ctx.allocate(user.id, prize.id, 2).await;
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/win/raffle/{}/remove", prize.id))
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ctx.held(user.id, prize.id).await, 1);
        assert_eq!(body["data"]["tickets"]["allocated"], 1);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/win/raffle/{}/remove", prize.id))
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ctx.held(user.id, prize.id).await, 0);
        assert_eq!(body["data"]["prizes"][0]["allocated"], 0);
        assert!(body["data"]["prizes"][0]["remove_ticket_url"].is_null());
    }

    #[actix_web::test]
    async fn test_remove_ticket_without_ticket() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let prize = ctx.add_prize("New prize", "Round 2").await;
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/win/raffle/{}/remove", prize.id))
            .insert_header(ctx.bearer(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(ctx.held(user.id, prize.id).await, 0);
    }

    #[actix_web::test]
    async fn test_raffle_after_deadline() {
        let ctx = TestContext::new().await;
        ctx.set_finished_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let prize = ctx.add_prize("Last prize", "Round 2").await;
        ctx.allocate(user.id, prize.id, 1).await;
        let app = init_app!(ctx);

        let req = test::TestRequest::get()
            .uri("/api/v1/win")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let data = &body["data"];
        assert_eq!(data["title"], "Round 2 Raffle");
        assert_eq!(data["is_over"], true);
        assert_eq!(data["message"], RAFFLE_OVER_MESSAGE);
        assert!(data["prizes"].as_array().unwrap().is_empty());

        for action in ["add", "remove"] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/win/raffle/{}/{action}", prize.id))
                .insert_header(ctx.bearer(&user))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(ctx.held(user.id, prize.id).await, 1);
        }
    }

    #[actix_web::test]
    async fn test_prize_outside_current_round_is_frozen() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let old = ctx.add_prize("Old prize", "Round 1").await;
        ctx.allocate(user.id, old.id, 1).await;
        let app = init_app!(ctx);

        for action in ["add", "remove"] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/win/raffle/{}/{action}", old.id))
                .insert_header(ctx.bearer(&user))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(ctx.held(user.id, old.id).await, 1);
            // 旧轮次的券仍计入已分配
            assert_eq!(body["data"]["tickets"]["allocated"], 1);
        }
    }

    #[actix_web::test]
    async fn test_unknown_prize_is_not_found() {
        let ctx = TestContext::new().await;
        ctx.set_two_rounds(Utc::now()).await;
        let user = ctx.create_user("alice", false, 50).await;
        let app = init_app!(ctx);

        let req = test::TestRequest::post()
            .uri("/api/v1/win/raffle/999/add")
            .insert_header(ctx.bearer(&user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_win_index_requires_token() {
        let ctx = TestContext::new().await;
        let app = init_app!(ctx);

        let req = test::TestRequest::get().uri("/api/v1/win").to_request();
        let err = test::try_call_service(&app, req)
            .await
            .err()
            .expect("request without token is rejected");
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
