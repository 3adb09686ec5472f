use std::time::{Duration, Instant};

use crate::session::SessionId;

/// Exam countdown owned by one session. It fires only for its owner, so a
/// countdown outliving its session cannot submit a later one.
#[derive(Clone, Debug)]
pub struct Countdown {
    owner: SessionId,
    started: Instant,
    deadline: Instant,
}

impl Countdown {
    pub fn start(owner: SessionId, limit: Duration, now: Instant) -> Self {
        Self {
            owner,
            started: now,
            deadline: now + limit,
        }
    }

    pub fn owner(&self) -> SessionId {
        self.owner
    }

    pub fn limit(&self) -> Duration {
        self.deadline.duration_since(self.started)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Whole seconds left, rounded up so a fresh 40-minute exam shows 2400.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let rem = self.remaining(now);
        rem.as_secs() + u64::from(rem.subsec_nanos() > 0)
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started).min(self.limit())
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// `mm:ss`, with minutes allowed past 59.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
