use crate::entities::{
    points_transaction_entity as points_log, profile_entity as profiles,
    raffle_ticket_entity as tickets, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::raffle::TicketLedger;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
    UpdateMany,
};

#[derive(Clone)]
pub struct ProfileService {
    pool: DatabaseConnection,
    ledger: TicketLedger,
}

impl ProfileService {
    pub fn new(pool: DatabaseConnection, ledger: TicketLedger) -> Self {
        Self { pool, ledger }
    }

    /// 获取用户积分与抽奖券概览
    pub async fn get_profile(&self, user_id: i32) -> AppResult<ProfileResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let profile = ensure_profile(&self.pool, user_id).await?;
        let allocated = allocated_total(&self.pool, user_id).await?;

        Ok(ProfileResponse {
            user_id,
            username: user.username,
            points: profile.points,
            points_per_ticket: self.ledger.points_per_ticket(),
            tickets: self.ledger.summary(profile.points, allocated),
        })
    }

    /// 发放积分并记录流水
    pub async fn add_points(
        &self,
        user_id: i32,
        points: i32,
        reason: &str,
        awarded_at: DateTime<Utc>,
    ) -> AppResult<ProfileResponse> {
        if points <= 0 {
            return Err(AppError::ValidationError(
                "Points to award must be positive".to_string(),
            ));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::ValidationError(
                "A reason is required when awarding points".to_string(),
            ));
        }

        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let txn = self.pool.begin().await?;
        ensure_profile(&txn, user_id).await?;

        // 原子累加，并发发放不会互相覆盖；超出上限时不更新
        let result = points_increment(user_id, points, Utc::now())
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            txn.rollback().await?;
            return Err(AppError::ValidationError(
                "Points total overflow".to_string(),
            ));
        }

        points_log::ActiveModel {
            user_id: Set(user_id),
            points: Set(points),
            reason: Set(reason.to_string()),
            awarded_at: Set(awarded_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        let profile = self.get_profile(user_id).await?;
        log::info!(
            "Awarded {points} points to user {user_id} ({reason}), total {}",
            profile.points
        );

        Ok(profile)
    }

    /// 分页获取积分流水（倒序）
    pub async fn points_history(
        &self,
        user_id: i32,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PointsTransactionResponse>> {
        let base_query =
            points_log::Entity::find().filter(points_log::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await?;

        let items = base_query
            .order_by_desc(points_log::Column::AwardedAt)
            .order_by_desc(points_log::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(PaginatedResponse::new(items, params, total))
    }
}

/// 获取用户积分档案（不存在则初始化）
pub(crate) async fn ensure_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<profiles::Model, DbErr> {
    if let Some(m) = profiles::Entity::find()
        .filter(profiles::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        return Ok(m);
    }
    let now = Utc::now();
    profiles::ActiveModel {
        user_id: Set(user_id),
        points: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// 积分累加语句：points = points + n，仅在不会溢出时命中
pub(crate) fn points_increment(
    user_id: i32,
    points: i32,
    now: DateTime<Utc>,
) -> UpdateMany<profiles::Entity> {
    profiles::Entity::update_many()
        .col_expr(
            profiles::Column::Points,
            Expr::col(profiles::Column::Points).add(points),
        )
        .col_expr(profiles::Column::UpdatedAt, Expr::value(now))
        .filter(profiles::Column::UserId.eq(user_id))
        .filter(profiles::Column::Points.lte(i32::MAX - points))
}

/// 加行锁查询积分档案（Postgres 下为 SELECT ... FOR UPDATE）
pub(crate) fn locked_profile_query(user_id: i32) -> Select<profiles::Entity> {
    profiles::Entity::find()
        .filter(profiles::Column::UserId.eq(user_id))
        .lock_exclusive()
}

/// 在事务内锁定用户积分档案，同一用户的抽奖券变动由此串行化
pub(crate) async fn lock_profile<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<profiles::Model, DbErr> {
    ensure_profile(db, user_id).await?;
    locked_profile_query(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("profile of user {user_id}")))
}

/// 用户在所有奖品上已分配的券数合计
pub(crate) async fn allocated_total<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<i32, DbErr> {
    let rows = tickets::Entity::find()
        .filter(tickets::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    Ok(rows.iter().map(|t| t.count).sum())
}
