use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::round_setting_entity;
use crate::raffle::{RoundGate, RoundStatus};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateRoundRequest {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 修改轮次时间窗口，未提供的字段保持不变
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateRoundRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundResponse {
    pub id: i32,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: RoundStatus,
}

impl RoundResponse {
    pub fn from_model(m: round_setting_entity::Model, gate: &RoundGate) -> Self {
        let status = gate.status(&m);
        RoundResponse {
            id: m.id,
            name: m.name,
            start: m.start,
            end: m.end,
            status,
        }
    }
}
