//! 抽奖业务规则（不涉及 I/O）
//!
//! `ledger` 负责券数统计，`round_gate` 判断某一时刻轮次允许的操作，`draw` 负责开奖。
//! 服务层传入数据库中读取的数据以及显式的 `now`。

pub mod draw;
pub mod ledger;
pub mod round_gate;

pub use draw::*;
pub use ledger::*;
pub use round_gate::*;
