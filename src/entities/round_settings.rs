use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::raffle::RoundWindow;

/// 挑战轮次配置
/// - 时间窗口 [start, end]，两端包含
/// - 相邻轮次允许首尾相接，不允许重叠（由 RoundService 校验）
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "round_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 与另一个窗口是否重叠（首尾相接不算重叠）
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

impl RoundWindow for Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> DateTime<Utc> {
        self.start
    }

    fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
