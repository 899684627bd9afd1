use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 用户在某个奖品上分配的抽奖券
/// (user_id, prize_id) 唯一；count 降为 0 时删除该行
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "raffle_tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub prize_id: i32,
    pub count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::raffle_prizes::Entity",
        from = "Column::PrizeId",
        to = "super::raffle_prizes::Column::Id"
    )]
    Prize,
}

impl Related<super::raffle_prizes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Prize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
