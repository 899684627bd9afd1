//! 测试公共夹具：已执行迁移的内存 sqlite 连接，以及轮次、用户、奖品、抽奖券的构造方法

use chrono::{DateTime, Duration, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::app::AppServices;
use crate::entities::{
    profile_entity as profiles, raffle_prize_entity as prizes, raffle_ticket_entity as tickets,
    round_setting_entity as rounds, user_entity as users,
};
use crate::raffle::TicketLedger;
use crate::services::profile_service::ensure_profile;
use crate::utils::JwtService;

pub(crate) const TEST_SECRET: &str = "test-secret-with-enough-length-0123456789";

pub(crate) struct TestContext {
    pub db: DatabaseConnection,
    pub jwt: JwtService,
    pub services: AppServices,
}

impl TestContext {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        // 内存库只存在于单个连接中
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.expect("connect sqlite");
        Migrator::up(&db, None).await.expect("run migrations");

        let jwt = JwtService::new(TEST_SECRET, 3600, 86400);
        let services = AppServices::new(db.clone(), jwt.clone(), TicketLedger::default());
        Self { db, jwt, services }
    }

    pub async fn add_round(
        &self,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> rounds::Model {
        rounds::ActiveModel {
            name: Set(name.to_string()),
            start: Set(start),
            end: Set(end),
            created_at: Set(start),
            updated_at: Set(start),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert round")
    }

    /// 第一轮一天前结束；第二轮随即开始，还剩六天
    pub async fn set_two_rounds(&self, now: DateTime<Utc>) -> (rounds::Model, rounds::Model) {
        let r1 = self
            .add_round("Round 1", now - Duration::days(8), now - Duration::days(1))
            .await;
        let r2 = self
            .add_round("Round 2", now - Duration::days(1), now + Duration::days(6))
            .await;
        (r1, r2)
    }

    /// 两个轮次都已结束
    pub async fn set_finished_rounds(&self, now: DateTime<Utc>) -> (rounds::Model, rounds::Model) {
        let r1 = self
            .add_round("Round 1", now - Duration::days(15), now - Duration::days(8))
            .await;
        let r2 = self
            .add_round("Round 2", now - Duration::days(8), now - Duration::days(1))
            .await;
        (r1, r2)
    }

    /// 直接插入用户并设置积分（跳过 bcrypt）
    pub async fn create_user(&self, username: &str, is_admin: bool, points: i32) -> users::Model {
        let now = Utc::now();
        let user = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            is_admin: Set(is_admin),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert user");

        let profile = ensure_profile(&self.db, user.id).await.expect("profile");
        let mut am: profiles::ActiveModel = profile.into();
        am.points = Set(points);
        am.update(&self.db).await.expect("set points");
        user
    }

    pub fn token_for(&self, user: &users::Model) -> String {
        self.jwt
            .generate_access_token(user.id, &user.username, user.is_admin)
            .expect("token")
    }

    pub fn bearer(&self, user: &users::Model) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token_for(user)))
    }

    pub async fn add_prize(&self, title: &str, round_name: &str) -> prizes::Model {
        let now = Utc::now();
        prizes::ActiveModel {
            title: Set(title.to_string()),
            description: Set(format!("{title} for the raffle")),
            round_name: Set(round_name.to_string()),
            value: Set(10),
            winner_user_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert prize")
    }

    pub async fn allocate(&self, user_id: i32, prize_id: i32, count: i32) -> tickets::Model {
        let now = Utc::now();
        tickets::ActiveModel {
            user_id: Set(user_id),
            prize_id: Set(prize_id),
            count: Set(count),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("insert tickets")
    }

    /// 用户在某奖品上的券数，无记录时为 0
    pub async fn held(&self, user_id: i32, prize_id: i32) -> i32 {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        tickets::Entity::find()
            .filter(tickets::Column::UserId.eq(user_id))
            .filter(tickets::Column::PrizeId.eq(prize_id))
            .one(&self.db)
            .await
            .expect("query tickets")
            .map(|t| t.count)
            .unwrap_or(0)
    }
}
