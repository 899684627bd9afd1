use serde::Serialize;
use utoipa::ToSchema;

use super::RoundStatus;

/// 每张抽奖券所需的默认积分
pub const DEFAULT_POINTS_PER_TICKET: i32 = 25;

/// 抽奖券统计（总数 / 已分配 / 可用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TicketSummary {
    /// 积分换算出的总券数
    pub total: i32,
    /// 已分配到奖品上的券数（所有奖品合计）
    pub allocated: i32,
    /// 剩余可分配券数
    pub available: i32,
}

impl TicketSummary {
    pub fn headline(&self) -> String {
        format!(
            "Your total raffle tickets: {} Allocated right now: {} Available: {}",
            self.total, self.allocated, self.available
        )
    }
}

/// 抽奖券变动的校验结果
///
/// 除 `Applied` 外均不修改任何数据，调用方按原样渲染页面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketDecision {
    Applied,
    NoTicketsAvailable,
    NothingAllocated,
    RoundNotCurrent,
    RoundOver,
}

impl TicketDecision {
    pub fn is_applied(self) -> bool {
        self == TicketDecision::Applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketLedger {
    points_per_ticket: i32,
}

impl Default for TicketLedger {
    fn default() -> Self {
        Self::new(DEFAULT_POINTS_PER_TICKET)
    }
}

impl TicketLedger {
    /// 非正数的兑换比例按 1 积分 1 张券处理
    pub fn new(points_per_ticket: i32) -> Self {
        Self {
            points_per_ticket: points_per_ticket.max(1),
        }
    }

    pub fn points_per_ticket(&self) -> i32 {
        self.points_per_ticket
    }

    pub fn ticket_count(&self, points: i32) -> i32 {
        points.max(0) / self.points_per_ticket
    }

    pub fn available(&self, points: i32, allocated: i32) -> i32 {
        (self.ticket_count(points) - allocated.max(0)).max(0)
    }

    pub fn summary(&self, points: i32, allocated: i32) -> TicketSummary {
        let allocated = allocated.max(0);
        TicketSummary {
            total: self.ticket_count(points),
            allocated,
            available: self.available(points, allocated),
        }
    }

    /// `allocated` 为用户在所有奖品上的已分配券数合计
    pub fn check_allocate(&self, points: i32, allocated: i32, round: RoundStatus) -> TicketDecision {
        match round {
            RoundStatus::Over => TicketDecision::RoundOver,
            RoundStatus::Upcoming => TicketDecision::RoundNotCurrent,
            RoundStatus::Current if self.available(points, allocated) > 0 => {
                TicketDecision::Applied
            }
            RoundStatus::Current => TicketDecision::NoTicketsAvailable,
        }
    }

    /// `prize_allocation` 为用户在该奖品上的券数
    pub fn check_deallocate(&self, prize_allocation: i32, round: RoundStatus) -> TicketDecision {
        match round {
            RoundStatus::Over => TicketDecision::RoundOver,
            RoundStatus::Upcoming => TicketDecision::RoundNotCurrent,
            RoundStatus::Current if prize_allocation > 0 => TicketDecision::Applied,
            RoundStatus::Current => TicketDecision::NothingAllocated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ticket_count_uses_integer_division() {
        let ledger = TicketLedger::default();
        assert_eq!(ledger.ticket_count(0), 0);
        assert_eq!(ledger.ticket_count(24), 0);
        assert_eq!(ledger.ticket_count(25), 1);
        assert_eq!(ledger.ticket_count(49), 1);
        assert_eq!(ledger.ticket_count(50), 2);
        assert_eq!(ledger.ticket_count(-10), 0);
    }

    #[test]
    fn test_headline_format() {
        let summary = TicketLedger::default().summary(50, 1);
        assert_eq!(
            summary.headline(),
            "Your total raffle tickets: 2 Allocated right now: 1 Available: 1"
        );
    }

    #[test]
    fn test_scenario_allocate_then_deallocate() {
        let ledger = TicketLedger::default();
        assert_eq!(
            ledger.summary(0, 0),
            TicketSummary {
                total: 0,
                allocated: 0,
                available: 0
            }
        );

        let points = 25;
        assert_eq!(ledger.summary(points, 0).available, 1);
        assert!(ledger.check_allocate(points, 0, RoundStatus::Current).is_applied());

        let after_add = ledger.summary(points, 1);
        assert_eq!((after_add.allocated, after_add.available), (1, 0));
        assert_eq!(
            ledger.check_allocate(points, 1, RoundStatus::Current),
            TicketDecision::NoTicketsAvailable
        );

        assert!(ledger.check_deallocate(1, RoundStatus::Current).is_applied());
        let after_remove = ledger.summary(points, 0);
        assert_eq!((after_remove.allocated, after_remove.available), (0, 1));
    }

    #[test]
    fn test_round_status_blocks_moves() {
        let ledger = TicketLedger::default();
        assert_eq!(
            ledger.check_allocate(100, 0, RoundStatus::Over),
            TicketDecision::RoundOver
        );
        assert_eq!(
            ledger.check_allocate(100, 0, RoundStatus::Upcoming),
            TicketDecision::RoundNotCurrent
        );
        assert_eq!(
            ledger.check_deallocate(3, RoundStatus::Over),
            TicketDecision::RoundOver
        );
        assert_eq!(
            ledger.check_deallocate(0, RoundStatus::Current),
            TicketDecision::NothingAllocated
        );
    }

    #[test]
    fn test_custom_rate() {
        let ledger = TicketLedger::new(10);
        assert_eq!(ledger.ticket_count(35), 3);
        assert_eq!(TicketLedger::new(0).points_per_ticket(), 1);
    }

    proptest! {
        #[test]
        fn prop_total_is_allocated_plus_available(points in 0i32..100_000, seed in 0i32..10_000) {
            let ledger = TicketLedger::default();
            let total = ledger.ticket_count(points);
            let allocated = if total == 0 { 0 } else { seed % (total + 1) };
            let summary = ledger.summary(points, allocated);
            prop_assert_eq!(summary.total, summary.allocated + summary.available);
            prop_assert!(summary.available >= 0);
        }

        #[test]
        fn prop_25_points_adds_exactly_one_ticket(points in 0i32..1_000_000) {
            let ledger = TicketLedger::default();
            prop_assert_eq!(ledger.ticket_count(points + 25), ledger.ticket_count(points) + 1);
        }

        #[test]
        fn prop_allocation_never_exceeds_total(points in 0i32..10_000) {
            let ledger = TicketLedger::default();
            let mut allocated = 0;
            while ledger.check_allocate(points, allocated, RoundStatus::Current).is_applied() {
                allocated += 1;
            }
            prop_assert_eq!(allocated, ledger.ticket_count(points));
            prop_assert_eq!(ledger.available(points, allocated), 0);
        }
    }
}
