use crate::entities::round_setting_entity as rounds;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::raffle::RoundGate;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct RoundService {
    pool: DatabaseConnection,
}

impl RoundService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 所有轮次（按开始时间升序）
    pub async fn all_rounds(&self) -> AppResult<Vec<rounds::Model>> {
        Ok(load_rounds(&self.pool).await?)
    }

    pub async fn list_rounds(&self, now: DateTime<Utc>) -> AppResult<Vec<RoundResponse>> {
        let gate = RoundGate::new(now);
        Ok(self
            .all_rounds()
            .await?
            .into_iter()
            .map(|m| RoundResponse::from_model(m, &gate))
            .collect())
    }

    pub async fn create_round(
        &self,
        request: CreateRoundRequest,
        now: DateTime<Utc>,
    ) -> AppResult<RoundResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError(
                "Round name is required".to_string(),
            ));
        }
        validate_window(request.start, request.end)?;

        let existing = self.all_rounds().await?;
        if existing.iter().any(|r| r.name == name) {
            return Err(AppError::ValidationError(format!(
                "Round '{name}' already exists"
            )));
        }
        check_overlap(&existing, None, request.start, request.end)?;

        let model = rounds::ActiveModel {
            name: Set(name),
            start: Set(request.start),
            end: Set(request.end),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Created round {} [{} - {}]",
            model.name,
            model.start,
            model.end
        );
        Ok(RoundResponse::from_model(model, &RoundGate::new(now)))
    }

    /// 修改轮次时间窗口（例如提前结束）
    pub async fn update_round(
        &self,
        round_id: i32,
        request: UpdateRoundRequest,
        now: DateTime<Utc>,
    ) -> AppResult<RoundResponse> {
        let existing = self.all_rounds().await?;
        let current = existing
            .iter()
            .find(|r| r.id == round_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Round not found".to_string()))?;

        let start = request.start.unwrap_or(current.start);
        let end = request.end.unwrap_or(current.end);
        validate_window(start, end)?;
        check_overlap(&existing, Some(round_id), start, end)?;

        let mut am = current.into_active_model();
        am.start = Set(start);
        am.end = Set(end);
        am.updated_at = Set(now);
        let model = am.update(&self.pool).await?;

        log::info!(
            "Updated round {} to [{} - {}]",
            model.name,
            model.start,
            model.end
        );
        Ok(RoundResponse::from_model(model, &RoundGate::new(now)))
    }
}

pub(crate) async fn load_rounds<C: ConnectionTrait>(db: &C) -> Result<Vec<rounds::Model>, DbErr> {
    rounds::Entity::find()
        .order_by_asc(rounds::Column::Start)
        .all(db)
        .await
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if start >= end {
        return Err(AppError::ValidationError(
            "Round start must be before its end".to_string(),
        ));
    }
    Ok(())
}

fn check_overlap(
    existing: &[rounds::Model],
    skip_id: Option<i32>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<()> {
    if let Some(other) = existing
        .iter()
        .filter(|r| Some(r.id) != skip_id)
        .find(|r| r.overlaps(start, end))
    {
        return Err(AppError::ValidationError(format!(
            "Round window overlaps round '{}'",
            other.name
        )));
    }
    Ok(())
}
