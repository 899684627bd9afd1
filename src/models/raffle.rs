use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{raffle_prize_entity as prize_entity, round_setting_entity};
use crate::error::AppResult;
use crate::raffle::{RoundStatus, TicketSummary};
use crate::utils::format_deadline;

pub const RAFFLE_OVER_MESSAGE: &str = "The raffle is now over.";
pub const RAFFLE_NOT_STARTED_MESSAGE: &str = "The raffle has not started yet.";

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePrizeRequest {
    pub title: String,
    pub description: String,
    /// 所属轮次名称（必须已存在）
    pub round_name: String,
    /// 奖品价值
    pub value: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PrizeListQuery {
    pub round_name: Option<String>,
}

/// 奖品完整信息（管理端）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RafflePrizeResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub round_name: String,
    pub value: i32,
    pub winner_user_id: Option<i32>,
}

impl From<prize_entity::Model> for RafflePrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        RafflePrizeResponse {
            id: m.id,
            title: m.title,
            description: m.description,
            round_name: m.round_name,
            value: m.value,
            winner_user_id: m.winner_user_id,
        }
    }
}

/// 开奖结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResultResponse {
    pub prize: RafflePrizeResponse,
    pub winner_user_id: i32,
    pub winner_username: String,
    /// 参与该奖品的总券数
    pub total_tickets: i32,
}

/// 链接对应的抽奖券操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    Add,
    Remove,
}

impl TicketAction {
    /// 生成 URL 用的路由名
    pub fn route_name(self) -> &'static str {
        match self {
            TicketAction::Add => "raffle_add_ticket",
            TicketAction::Remove => "raffle_remove_ticket",
        }
    }
}

/// 当前用户视角的奖品（尚未生成链接）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeView {
    pub prize: prize_entity::Model,
    pub allocated: i32,
    pub can_add: bool,
    pub can_remove: bool,
}

/// `win_index` 页面数据（尚未生成链接）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RafflePageView {
    pub round: Option<round_setting_entity::Model>,
    pub round_status: Option<RoundStatus>,
    pub tickets: TicketSummary,
    pub prizes: Vec<PrizeView>,
}

impl RafflePageView {
    pub fn is_over(&self) -> bool {
        self.round_status == Some(RoundStatus::Over)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RaffleRoundInfo {
    pub name: String,
    pub status: RoundStatus,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RafflePrizeEntry {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub round_name: String,
    pub value: i32,
    /// 当前用户在该奖品上的券数
    pub allocated: i32,
    /// 可追加一张券时给出
    pub add_ticket_url: Option<String>,
    /// 可撤回一张券时给出
    pub remove_ticket_url: Option<String>,
}

/// 抽奖页面（win_index）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RafflePageResponse {
    pub round: Option<RaffleRoundInfo>,
    /// 例如 "Round 2 Raffle"
    pub title: Option<String>,
    /// 轮次截止时间，例如 "Mar. 7, 2026, 3:07 PM"
    pub deadline: Option<String>,
    pub tickets: TicketSummary,
    /// "Your total raffle tickets: .. Allocated right now: .. Available: .."
    pub summary: String,
    pub is_over: bool,
    pub message: Option<String>,
    pub prizes: Vec<RafflePrizeEntry>,
}

impl RafflePageResponse {
    /// `link` 根据操作和奖品ID生成 URL
    pub fn from_view<F>(view: RafflePageView, mut link: F) -> AppResult<Self>
    where
        F: FnMut(TicketAction, i32) -> AppResult<String>,
    {
        let is_over = view.is_over();
        // 轮次间隙展示下一个轮次，提示尚未开始；只有最后一个轮次结束后才提示结束
        let message = match view.round_status {
            None | Some(RoundStatus::Upcoming) => Some(RAFFLE_NOT_STARTED_MESSAGE.to_string()),
            Some(RoundStatus::Over) => Some(RAFFLE_OVER_MESSAGE.to_string()),
            Some(RoundStatus::Current) => None,
        };

        let mut prizes = Vec::with_capacity(view.prizes.len());
        for p in view.prizes {
            let id = p.prize.id;
            let add_ticket_url = if p.can_add {
                Some(link(TicketAction::Add, id)?)
            } else {
                None
            };
            let remove_ticket_url = if p.can_remove {
                Some(link(TicketAction::Remove, id)?)
            } else {
                None
            };
            prizes.push(RafflePrizeEntry {
                id,
                title: p.prize.title,
                description: p.prize.description,
                round_name: p.prize.round_name,
                value: p.prize.value,
                allocated: p.allocated,
                add_ticket_url,
                remove_ticket_url,
            });
        }

        let (round, title, deadline) = match (view.round, view.round_status) {
            (Some(r), Some(status)) => (
                Some(RaffleRoundInfo {
                    name: r.name.clone(),
                    status,
                    start: r.start,
                    end: r.end,
                }),
                Some(format!("{} Raffle", r.name)),
                Some(format_deadline(r.end)),
            ),
            _ => (None, None, None),
        };

        Ok(RafflePageResponse {
            round,
            title,
            deadline,
            tickets: view.tickets,
            summary: view.tickets.headline(),
            is_over,
            message,
            prizes,
        })
    }
}
