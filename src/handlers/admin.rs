use crate::middlewares::require_admin;
use crate::models::*;
use crate::services::{ProfileService, RaffleService, RoundService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/admin/rounds",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "轮次列表", body = [RoundResponse]),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_rounds(
    round_service: web::Data<RoundService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match round_service.list_rounds(Utc::now()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/rounds",
    tag = "admin",
    request_body = CreateRoundRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建轮次成功", body = RoundResponse),
        (status = 400, description = "时间窗口无效或与其它轮次重叠"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn create_round(
    round_service: web::Data<RoundService>,
    req: HttpRequest,
    request: web::Json<CreateRoundRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match round_service
        .create_round(request.into_inner(), Utc::now())
        .await
    {
        Ok(round) => Ok(HttpResponse::Ok().json(ApiResponse::success(round))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/rounds/{round_id}",
    tag = "admin",
    params(
        ("round_id" = i32, Path, description = "轮次ID")
    ),
    request_body = UpdateRoundRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "修改轮次成功", body = RoundResponse),
        (status = 400, description = "时间窗口无效或与其它轮次重叠"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "轮次不存在")
    )
)]
pub async fn update_round(
    round_service: web::Data<RoundService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<UpdateRoundRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match round_service
        .update_round(path.into_inner(), request.into_inner(), Utc::now())
        .await
    {
        Ok(round) => Ok(HttpResponse::Ok().json(ApiResponse::success(round))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/prizes",
    tag = "admin",
    params(
        ("round_name" = Option<String>, Query, description = "按轮次名称过滤")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "奖品列表", body = [RafflePrizeResponse]),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_prizes(
    raffle_service: web::Data<RaffleService>,
    req: HttpRequest,
    query: web::Query<PrizeListQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match raffle_service.list_prizes(query.round_name.as_deref()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/prizes",
    tag = "admin",
    request_body = CreatePrizeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建奖品成功", body = RafflePrizeResponse),
        (status = 400, description = "参数无效或轮次不存在"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn create_prize(
    raffle_service: web::Data<RaffleService>,
    req: HttpRequest,
    request: web::Json<CreatePrizeRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match raffle_service.create_prize(request.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Ok().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/prizes/{prize_id}/draw",
    tag = "admin",
    params(
        ("prize_id" = i32, Path, description = "奖品ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "开奖成功", body = DrawResultResponse),
        (status = 400, description = "轮次未结束、已开奖或无人投券"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "奖品不存在")
    )
)]
/// 对已结束轮次的奖品按券数加权开奖
pub async fn draw_winner(
    raffle_service: web::Data<RaffleService>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match raffle_service
        .draw_winner(path.into_inner(), Utc::now())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{user_id}/points",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "用户ID")
    ),
    request_body = AwardPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "发放积分成功", body = ProfileResponse),
        (status = 400, description = "积分必须为正数"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn award_points(
    profile_service: web::Data<ProfileService>,
    req: HttpRequest,
    path: web::Path<i32>,
    request: web::Json<AwardPointsRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    let request = request.into_inner();
    match profile_service
        .add_points(path.into_inner(), request.points, &request.reason, Utc::now())
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            profile,
            "Points awarded".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/rounds", web::get().to(list_rounds))
            .route("/rounds", web::post().to(create_round))
            .route("/rounds/{round_id}", web::put().to(update_round))
            .route("/prizes", web::get().to(list_prizes))
            .route("/prizes", web::post().to(create_prize))
            .route("/prizes/{prize_id}/draw", web::post().to(draw_winner))
            .route("/users/{user_id}/points", web::post().to(award_points)),
    );
}
