/// 用户在某个奖品上的投券
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketStake {
    pub user_id: i32,
    pub count: i32,
}

/// 参与开奖的总券数（忽略非正数）
pub fn total_tickets(stakes: &[TicketStake]) -> i32 {
    stakes.iter().map(|s| s.count.max(0)).sum()
}

/// 按投券顺序排列后，第 `pick` 张券（从 0 开始）的持有者
pub fn owner_of_ticket(stakes: &[TicketStake], pick: i32) -> Option<i32> {
    if pick < 0 {
        return None;
    }
    let mut acc = 0;
    for stake in stakes.iter().filter(|s| s.count > 0) {
        acc += stake.count;
        if pick < acc {
            return Some(stake.user_id);
        }
    }
    None
}

/// 按券数加权随机抽取中奖用户
pub fn pick_winner<G: rand::Rng>(stakes: &[TicketStake], rng: &mut G) -> Option<i32> {
    let total = total_tickets(stakes);
    if total <= 0 {
        return None;
    }
    owner_of_ticket(stakes, rng.gen_range(0..total))
}
