use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::points_transaction_entity;
use crate::raffle::TicketSummary;

/// 用户积分与抽奖券概览
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: i32,
    pub username: String,
    pub points: i32,
    /// 每张抽奖券所需积分
    pub points_per_ticket: i32,
    pub tickets: TicketSummary,
}

/// 管理员发放积分请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AwardPointsRequest {
    /// 发放积分（必须为正数）
    pub points: i32,
    /// 发放原因
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PointsTransactionResponse {
    pub id: i32,
    pub points: i32,
    pub reason: String,
    pub awarded_at: DateTime<Utc>,
}

impl From<points_transaction_entity::Model> for PointsTransactionResponse {
    fn from(m: points_transaction_entity::Model) -> Self {
        PointsTransactionResponse {
            id: m.id,
            points: m.points,
            reason: m.reason,
            awarded_at: m.awarded_at,
        }
    }
}
