//! 后台定时任务
//!
//! 轮次监控每分钟读取一次轮次设置，展示轮次或其状态（未开始/进行中/已结束）变化时记录日志。
//! 启动时调用一次 `spawn_all`。

use crate::raffle::{RoundGate, RoundStatus};
use crate::services::RoundService;
use chrono::Utc;

const ROUND_WATCH_INTERVAL_SECS: u64 = 60;

/// 记录上一次观察到的 (轮次, 状态)
#[derive(Debug, Default)]
pub struct RoundStatusTracker {
    last: Option<(String, RoundStatus)>,
}

impl RoundStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与上一次观察不同时返回 true
    pub fn observe(&mut self, name: &str, status: RoundStatus) -> bool {
        let changed = match &self.last {
            Some((last_name, last_status)) => last_name != name || *last_status != status,
            None => true,
        };
        if changed {
            self.last = Some((name.to_string(), status));
        }
        changed
    }

    pub fn last(&self) -> Option<&(String, RoundStatus)> {
        self.last.as_ref()
    }
}

/// 启动所有后台任务（不阻塞）
pub fn spawn_all(round_service: RoundService) {
    // 轮次状态监控（每分钟）
    tokio::spawn(async move {
        let mut tracker = RoundStatusTracker::new();
        loop {
            match round_service.all_rounds().await {
                Ok(rounds) => {
                    let gate = RoundGate::new(Utc::now());
                    match gate.display_round(&rounds) {
                        Some(round) => {
                            let status = gate.status(round);
                            if tracker.observe(&round.name, status) {
                                log::info!("Round {} is now {}", round.name, status);
                            }
                        }
                        None => log::debug!("No round has started yet"),
                    }
                }
                Err(e) => log::error!("Failed to load round settings: {e:?}"),
            }
            tokio::time::sleep(std::time::Duration::from_secs(ROUND_WATCH_INTERVAL_SECS)).await;
        }
    });
}
