use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 抽奖奖品
/// - round_name: 所属轮次名称（对应 round_settings.name）
/// - value: 奖品价值（美元）
/// - winner_user_id: 开奖后写入，NULL 表示尚未开奖
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "raffle_prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub round_name: String,
    pub value: i32,
    pub winner_user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn is_drawn(&self) -> bool {
        self.winner_user_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::raffle_tickets::Entity")]
    Tickets,
}

impl Related<super::raffle_tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
