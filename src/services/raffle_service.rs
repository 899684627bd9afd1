use std::collections::HashMap;

use crate::entities::{
    raffle_prize_entity as prizes, raffle_ticket_entity as tickets, round_setting_entity as rounds,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::raffle::{RoundGate, TicketDecision, TicketLedger, TicketStake, pick_winner};
use crate::services::profile_service::{ensure_profile, lock_profile};
use crate::services::round_service::load_rounds;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct RaffleService {
    pool: DatabaseConnection,
    ledger: TicketLedger,
}

impl RaffleService {
    pub fn new(pool: DatabaseConnection, ledger: TicketLedger) -> Self {
        Self { pool, ledger }
    }

    pub fn ledger(&self) -> TicketLedger {
        self.ledger
    }

    /// 抽奖页面数据（win_index）
    pub async fn page(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<RafflePageView> {
        let gate = RoundGate::new(now);
        let round_list = load_rounds(&self.pool).await?;

        // 只有当前轮次的奖品可见
        let prize_list = match gate.current(&round_list) {
            Some(current) => {
                prizes::Entity::find()
                    .filter(prizes::Column::RoundName.eq(current.name.as_str()))
                    .order_by_asc(prizes::Column::Id)
                    .all(&self.pool)
                    .await?
            }
            None => Vec::new(),
        };

        let profile = ensure_profile(&self.pool, user_id).await?;
        let allocations = allocation_map(&self.pool, user_id).await?;

        Ok(assemble_page(
            &self.ledger,
            &gate,
            round_list,
            prize_list,
            profile.points,
            &allocations,
        ))
    }

    /// 给奖品追加一张券；条件不满足时不做任何修改
    pub async fn add_ticket(
        &self,
        user_id: i32,
        prize_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<RafflePageView> {
        let prize = self.get_prize(prize_id).await?;
        let gate = RoundGate::new(now);
        let status = gate.prize_status(&prize.round_name, &load_rounds(&self.pool).await?);

        let txn = self.pool.begin().await?;
        // 先锁积分档案再读已分配券数，并发追加不会超出总券数
        let profile = lock_profile(&txn, user_id).await?;
        let allocations = allocation_rows(&txn, user_id).await?;
        let allocated: i32 = allocations.iter().map(|t| t.count).sum();

        let decision = self.ledger.check_allocate(profile.points, allocated, status);
        if decision.is_applied() {
            let existing = allocations.into_iter().find(|t| t.prize_id == prize_id);
            match existing {
                Some(row) => {
                    let count = row.count;
                    let mut am = row.into_active_model();
                    am.count = Set(count + 1);
                    am.updated_at = Set(now);
                    am.update(&txn).await?;
                }
                None => {
                    tickets::ActiveModel {
                        user_id: Set(user_id),
                        prize_id: Set(prize_id),
                        count: Set(1),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
            log::info!("User {user_id} allocated a ticket to prize {prize_id}");
        } else {
            log_skipped("allocation", user_id, prize_id, decision);
        }
        txn.commit().await?;

        self.page(user_id, now).await
    }

    /// 从奖品撤回一张券；没有已分配的券时不做任何修改
    pub async fn remove_ticket(
        &self,
        user_id: i32,
        prize_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<RafflePageView> {
        let prize = self.get_prize(prize_id).await?;
        let gate = RoundGate::new(now);
        let status = gate.prize_status(&prize.round_name, &load_rounds(&self.pool).await?);

        let txn = self.pool.begin().await?;
        lock_profile(&txn, user_id).await?;
        let existing = tickets::Entity::find()
            .filter(tickets::Column::UserId.eq(user_id))
            .filter(tickets::Column::PrizeId.eq(prize_id))
            .one(&txn)
            .await?;
        let held = existing.as_ref().map(|t| t.count).unwrap_or(0);

        let decision = self.ledger.check_deallocate(held, status);
        match (decision, existing) {
            (TicketDecision::Applied, Some(row)) if row.count > 1 => {
                let count = row.count;
                let mut am = row.into_active_model();
                am.count = Set(count - 1);
                am.updated_at = Set(now);
                am.update(&txn).await?;
                log::info!("User {user_id} removed a ticket from prize {prize_id}");
            }
            (TicketDecision::Applied, Some(row)) => {
                row.delete(&txn).await?;
                log::info!("User {user_id} removed their last ticket from prize {prize_id}");
            }
            (decision, _) => log_skipped("deallocation", user_id, prize_id, decision),
        }
        txn.commit().await?;

        self.page(user_id, now).await
    }

    pub async fn create_prize(&self, request: CreatePrizeRequest) -> AppResult<RafflePrizeResponse> {
        let title = request.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError(
                "Prize title is required".to_string(),
            ));
        }
        if request.value < 0 {
            return Err(AppError::ValidationError(
                "Prize value cannot be negative".to_string(),
            ));
        }
        let round = rounds::Entity::find()
            .filter(rounds::Column::Name.eq(request.round_name.as_str()))
            .one(&self.pool)
            .await?;
        if round.is_none() {
            return Err(AppError::ValidationError(format!(
                "Round '{}' does not exist",
                request.round_name
            )));
        }

        let now = Utc::now();
        let model = prizes::ActiveModel {
            title: Set(title),
            description: Set(request.description),
            round_name: Set(request.round_name),
            value: Set(request.value),
            winner_user_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created prize {} for {}", model.id, model.round_name);
        Ok(model.into())
    }

    pub async fn list_prizes(&self, round_name: Option<&str>) -> AppResult<Vec<RafflePrizeResponse>> {
        let mut query = prizes::Entity::find();
        if let Some(name) = round_name {
            query = query.filter(prizes::Column::RoundName.eq(name));
        }
        let list = query.order_by_asc(prizes::Column::Id).all(&self.pool).await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 开奖
    ///
    /// 逻辑:
    /// 1. 奖品所属轮次必须已结束，且奖品尚未开奖
    /// 2. 按用户在该奖品上的券数加权随机抽取
    /// 3. 条件更新 (where winner_user_id IS NULL) 写入中奖用户，防止重复开奖
    pub async fn draw_winner(&self, prize_id: i32, now: DateTime<Utc>) -> AppResult<DrawResultResponse> {
        let prize = self.get_prize(prize_id).await?;
        if prize.is_drawn() {
            return Err(AppError::ValidationError(
                "Prize already has a winner".to_string(),
            ));
        }

        let round_list = load_rounds(&self.pool).await?;
        let round = round_list
            .iter()
            .find(|r| r.name == prize.round_name)
            .ok_or_else(|| {
                AppError::ValidationError(format!("Round '{}' does not exist", prize.round_name))
            })?;
        if !RoundGate::new(now).is_over(round) {
            return Err(AppError::ValidationError(
                "Round is not over yet".to_string(),
            ));
        }

        let stakes: Vec<TicketStake> = tickets::Entity::find()
            .filter(tickets::Column::PrizeId.eq(prize_id))
            .order_by_asc(tickets::Column::Id)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|t| TicketStake {
                user_id: t.user_id,
                count: t.count,
            })
            .collect();
        let total_tickets = crate::raffle::total_tickets(&stakes);

        let winner_id = {
            let mut rng = rand::thread_rng();
            pick_winner(&stakes, &mut rng)
        }
        .ok_or_else(|| {
            AppError::ValidationError("No tickets allocated to this prize".to_string())
        })?;

        let result = prizes::Entity::update_many()
            .col_expr(
                prizes::Column::WinnerUserId,
                sea_orm::sea_query::Expr::value(winner_id),
            )
            .col_expr(prizes::Column::UpdatedAt, sea_orm::sea_query::Expr::value(now))
            .filter(prizes::Column::Id.eq(prize_id))
            .filter(prizes::Column::WinnerUserId.is_null())
            .exec(&self.pool)
            .await?;
        if result.rows_affected != 1 {
            return Err(AppError::ValidationError(
                "Prize already has a winner".to_string(),
            ));
        }

        let winner = users::Entity::find_by_id(winner_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::InternalError("Winner disappeared".to_string()))?;
        let prize = self.get_prize(prize_id).await?;

        log::info!(
            "Prize {} ({}) drawn: winner {} out of {} tickets",
            prize.id,
            prize.round_name,
            winner.username,
            total_tickets
        );

        Ok(DrawResultResponse {
            prize: prize.into(),
            winner_user_id: winner.id,
            winner_username: winner.username,
            total_tickets,
        })
    }

    async fn get_prize(&self, prize_id: i32) -> AppResult<prizes::Model> {
        prizes::Entity::find_by_id(prize_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Prize not found".to_string()))
    }
}

fn log_skipped(action: &str, user_id: i32, prize_id: i32, decision: TicketDecision) {
    log::debug!("Ticket {action} skipped for user {user_id} on prize {prize_id}: {decision:?}");
}

async fn allocation_rows<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<tickets::Model>, DbErr> {
    tickets::Entity::find()
        .filter(tickets::Column::UserId.eq(user_id))
        .all(db)
        .await
}

async fn allocation_map<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<HashMap<i32, i32>, DbErr> {
    Ok(allocation_rows(db, user_id)
        .await?
        .into_iter()
        .map(|t| (t.prize_id, t.count))
        .collect())
}

/// 由已加载的数据组装页面；`allocations` 为 奖品ID -> 当前用户券数
fn assemble_page(
    ledger: &TicketLedger,
    gate: &RoundGate,
    round_list: Vec<rounds::Model>,
    prize_list: Vec<prizes::Model>,
    points: i32,
    allocations: &HashMap<i32, i32>,
) -> RafflePageView {
    let allocated: i32 = allocations.values().sum();
    let tickets = ledger.summary(points, allocated);

    let round = gate.display_round(&round_list).cloned();
    let round_status = round.as_ref().map(|r| gate.status(r));

    let mut prize_views: Vec<PrizeView> = prize_list
        .into_iter()
        .filter(|p| gate.is_prize_visible(&p.round_name, &round_list))
        .map(|prize| {
            let status = gate.prize_status(&prize.round_name, &round_list);
            let held = allocations.get(&prize.id).copied().unwrap_or(0);
            PrizeView {
                allocated: held,
                can_add: ledger.check_allocate(points, allocated, status).is_applied(),
                can_remove: ledger.check_deallocate(held, status).is_applied(),
                prize,
            }
        })
        .collect();
    prize_views.sort_by_key(|p| p.prize.id);

    RafflePageView {
        round,
        round_status,
        tickets,
        prizes: prize_views,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raffle::RoundStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap()
    }

    fn round(id: i32, name: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> rounds::Model {
        rounds::Model {
            id,
            name: name.to_string(),
            start,
            end,
            created_at: start,
            updated_at: start,
        }
    }

    fn two_rounds() -> Vec<rounds::Model> {
        let start = now() - Duration::days(8);
        let end1 = start + Duration::days(7);
        vec![
            round(1, "Round 1", start, end1),
            round(2, "Round 2", end1, end1 + Duration::days(7)),
        ]
    }

    fn prize(id: i32, round_name: &str) -> prizes::Model {
        prizes::Model {
            id,
            title: format!("Prize {id}"),
            description: "A raffle prize for testing".to_string(),
            round_name: round_name.to_string(),
            value: 5,
            winner_user_id: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_page_hides_prizes_from_other_rounds() {
        let view = assemble_page(
            &TicketLedger::default(),
            &RoundGate::new(now()),
            two_rounds(),
            vec![prize(2, "Round 2"), prize(1, "Round 1")],
            0,
            &HashMap::new(),
        );
        assert_eq!(view.round.as_ref().map(|r| r.name.as_str()), Some("Round 2"));
        assert_eq!(view.round_status, Some(RoundStatus::Current));
        assert_eq!(view.prizes.len(), 1);
        assert_eq!(view.prizes[0].prize.id, 2);
        assert!(!view.prizes[0].can_add);
        assert!(!view.prizes[0].can_remove);
    }

    #[test]
    fn test_page_affordances_follow_ledger() {
        let mut allocations = HashMap::new();
        allocations.insert(2, 1);
        let view = assemble_page(
            &TicketLedger::default(),
            &RoundGate::new(now()),
            two_rounds(),
            vec![prize(2, "Round 2"), prize(3, "Round 2")],
            50,
            &allocations,
        );
        assert_eq!(view.tickets.headline(), "Your total raffle tickets: 2 Allocated right now: 1 Available: 1");
        assert!(view.prizes[0].can_add && view.prizes[0].can_remove);
        assert!(view.prizes[1].can_add && !view.prizes[1].can_remove);
    }

    #[test]
    fn test_page_after_last_round_is_over() {
        let round_list = two_rounds();
        let after = round_list[1].end + Duration::hours(1);
        let mut allocations = HashMap::new();
        allocations.insert(2, 1);
        let view = assemble_page(
            &TicketLedger::default(),
            &RoundGate::new(after),
            round_list,
            vec![prize(2, "Round 2")],
            25,
            &allocations,
        );
        assert!(view.is_over());
        assert!(view.prizes.is_empty());
        assert_eq!(view.tickets.allocated, 1);
    }

    #[test]
    fn test_page_between_rounds_is_not_over() {
        let round_list = vec![
            round(1, "Round 1", now() - Duration::days(8), now() - Duration::days(1)),
            round(2, "Round 2", now() + Duration::days(1), now() + Duration::days(8)),
        ];
        let view = assemble_page(
            &TicketLedger::default(),
            &RoundGate::new(now()),
            round_list,
            vec![prize(1, "Round 1"), prize(2, "Round 2")],
            25,
            &HashMap::new(),
        );
        assert_eq!(view.round.as_ref().map(|r| r.name.as_str()), Some("Round 2"));
        assert_eq!(view.round_status, Some(RoundStatus::Upcoming));
        assert!(!view.is_over());
        assert!(view.prizes.is_empty());

        let page = RafflePageResponse::from_view(view, |_, _| Ok(String::new())).unwrap();
        assert_eq!(page.title.as_deref(), Some("Round 2 Raffle"));
        assert!(!page.is_over);
        assert_eq!(page.message.as_deref(), Some(RAFFLE_NOT_STARTED_MESSAGE));
    }

    #[test]
    fn test_page_after_last_round_renders_terminal_message() {
        let round_list = two_rounds();
        let after = round_list[1].end + Duration::hours(1);
        let view = assemble_page(
            &TicketLedger::default(),
            &RoundGate::new(after),
            round_list,
            vec![prize(2, "Round 2")],
            0,
            &HashMap::new(),
        );
        let page = RafflePageResponse::from_view(view, |_, _| Ok(String::new())).unwrap();
        assert!(page.is_over);
        assert_eq!(page.message.as_deref(), Some(RAFFLE_OVER_MESSAGE));
    }
}

#[cfg(test)]
mod db_tests {
    use crate::raffle::RoundStatus;
    use crate::test_support::TestContext;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_allocation_is_bounded_by_owned_tickets() {
        let ctx = TestContext::new().await;
        let now = Utc::now();
        ctx.set_two_rounds(now).await;
        let user = ctx.create_user("alice", false, 60).await;
        let a = ctx.add_prize("Prize A", "Round 2").await;
        let b = ctx.add_prize("Prize B", "Round 2").await;
        let service = &ctx.services.raffle;

        service.add_ticket(user.id, a.id, now).await.unwrap();
        let view = service.add_ticket(user.id, b.id, now).await.unwrap();
        assert_eq!(view.tickets.total, 2);
        assert_eq!(view.tickets.allocated, 2);
        assert_eq!(view.tickets.available, 0);

        // 没有可用券时追加不生效
        let view = service.add_ticket(user.id, a.id, now).await.unwrap();
        assert_eq!(view.tickets.allocated, 2);
        assert_eq!(ctx.held(user.id, a.id).await, 1);

        service.remove_ticket(user.id, b.id, now).await.unwrap();
        assert_eq!(ctx.held(user.id, b.id).await, 0);
        let view = service.remove_ticket(user.id, b.id, now).await.unwrap();
        assert_eq!(view.tickets.allocated, 1);
        assert_eq!(view.round_status, Some(RoundStatus::Current));
    }

    #[tokio::test]
    async fn test_allocation_freezes_when_round_ends() {
        let ctx = TestContext::new().await;
        let now = Utc::now();
        ctx.set_two_rounds(now).await;
        let user = ctx.create_user("alice", false, 50).await;
        let prize = ctx.add_prize("Prize A", "Round 2").await;
        let service = &ctx.services.raffle;

        service.add_ticket(user.id, prize.id, now).await.unwrap();

        let later = now + Duration::days(7);
        let view = service.add_ticket(user.id, prize.id, later).await.unwrap();
        assert!(view.is_over());
        assert!(view.prizes.is_empty());
        service.remove_ticket(user.id, prize.id, later).await.unwrap();
        assert_eq!(ctx.held(user.id, prize.id).await, 1);
    }

    #[tokio::test]
    async fn test_draw_weights_by_ticket_count() {
        let ctx = TestContext::new().await;
        let now = Utc::now();
        ctx.set_finished_rounds(now).await;
        let alice = ctx.create_user("alice", false, 100).await;
        let bob = ctx.create_user("bob", false, 100).await;
        let prize = ctx.add_prize("Prize A", "Round 2").await;
        ctx.allocate(alice.id, prize.id, 3).await;
        ctx.allocate(bob.id, prize.id, 1).await;

        let result = ctx.services.raffle.draw_winner(prize.id, now).await.unwrap();
        assert_eq!(result.total_tickets, 4);
        assert!(result.winner_user_id == alice.id || result.winner_user_id == bob.id);
        assert_eq!(result.prize.winner_user_id, Some(result.winner_user_id));

        assert!(ctx.services.raffle.draw_winner(prize.id, now).await.is_err());
    }

    #[tokio::test]
    async fn test_draw_without_tickets_fails() {
        let ctx = TestContext::new().await;
        let now = Utc::now();
        ctx.set_finished_rounds(now).await;
        let prize = ctx.add_prize("Prize A", "Round 2").await;

        assert!(ctx.services.raffle.draw_winner(prize.id, now).await.is_err());
        let prizes = ctx.services.raffle.list_prizes(Some("Round 2")).await.unwrap();
        assert_eq!(prizes[0].winner_user_id, None);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_respect_ticket_total() {
        let ctx = TestContext::new().await;
        let now = Utc::now();
        ctx.set_two_rounds(now).await;
        let user = ctx.create_user("alice", false, 25).await;
        let a = ctx.add_prize("Prize A", "Round 2").await;
        let b = ctx.add_prize("Prize B", "Round 2").await;
        let service = &ctx.services.raffle;

        let (first, second) = tokio::join!(
            service.add_ticket(user.id, a.id, now),
            service.add_ticket(user.id, b.id, now)
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(ctx.held(user.id, a.id).await + ctx.held(user.id, b.id).await, 1);
        let view = service.page(user.id, now).await.unwrap();
        assert_eq!(view.tickets.allocated, 1);
        assert_eq!(view.tickets.available, 0);
    }
}
