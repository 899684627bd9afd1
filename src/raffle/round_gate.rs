use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 轮次状态：UPCOMING -> CURRENT -> OVER，只由时间驱动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Upcoming,
    Current,
    Over,
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Upcoming => write!(f, "upcoming"),
            RoundStatus::Current => write!(f, "current"),
            RoundStatus::Over => write!(f, "over"),
        }
    }
}

/// 具有名称和 `[start, end]` 时间窗口的轮次
pub trait RoundWindow {
    fn name(&self) -> &str;
    fn start(&self) -> DateTime<Utc>;
    fn end(&self) -> DateTime<Utc>;
}

/// 在固定时刻判断轮次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundGate {
    now: DateTime<Utc>,
}

impl RoundGate {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn status<R: RoundWindow>(&self, round: &R) -> RoundStatus {
        if self.now < round.start() {
            RoundStatus::Upcoming
        } else if self.now > round.end() {
            RoundStatus::Over
        } else {
            RoundStatus::Current
        }
    }

    pub fn is_current<R: RoundWindow>(&self, round: &R) -> bool {
        self.status(round) == RoundStatus::Current
    }

    pub fn is_over<R: RoundWindow>(&self, round: &R) -> bool {
        self.now > round.end()
    }

    /// 当前轮次；边界时刻两个轮次都包含 now 时取开始较晚的一个
    pub fn current<'r, R: RoundWindow>(&self, rounds: &'r [R]) -> Option<&'r R> {
        rounds
            .iter()
            .filter(|r| self.is_current(*r))
            .max_by_key(|r| r.start())
    }

    /// 展示用轮次：当前轮次；否则最近一个未开始的轮次（轮次间隙）；都没有时取最近结束的轮次。
    /// 因此只有不存在后续轮次时才会展示已结束的轮次。
    pub fn display_round<'r, R: RoundWindow>(&self, rounds: &'r [R]) -> Option<&'r R> {
        self.current(rounds)
            .or_else(|| self.next_upcoming(rounds))
            .or_else(|| {
                rounds
                    .iter()
                    .filter(|r| self.is_over(*r))
                    .max_by_key(|r| r.end())
            })
    }

    /// 开始时间最早的未开始轮次
    pub fn next_upcoming<'r, R: RoundWindow>(&self, rounds: &'r [R]) -> Option<&'r R> {
        rounds
            .iter()
            .filter(|r| self.now < r.start())
            .min_by_key(|r| r.start())
    }

    /// 只有当前轮次的奖品可见，其它轮次的奖品直接隐藏
    pub fn is_prize_visible<R: RoundWindow>(&self, prize_round_name: &str, rounds: &[R]) -> bool {
        self.current(rounds)
            .is_some_and(|current| current.name() == prize_round_name)
    }

    /// 指定名称轮次的状态；未知名称视为未开始
    pub fn status_of<R: RoundWindow>(&self, round_name: &str, rounds: &[R]) -> RoundStatus {
        rounds
            .iter()
            .find(|r| r.name() == round_name)
            .map(|r| self.status(r))
            .unwrap_or(RoundStatus::Upcoming)
    }

    /// 与 `status_of` 相同，但边界时刻让位给后一轮次的轮次视为已结束
    pub fn prize_status<R: RoundWindow>(&self, round_name: &str, rounds: &[R]) -> RoundStatus {
        match self.status_of(round_name, rounds) {
            RoundStatus::Current if !self.is_prize_visible(round_name, rounds) => RoundStatus::Over,
            status => status,
        }
    }
}
