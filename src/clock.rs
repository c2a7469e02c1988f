use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Time source and pacing for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Wait until the next cycle is due. Returns `false` when no further
    /// cycles should run.
    async fn tick(&mut self) -> bool;
}

/// Wall clock that pauses a fixed period between cycles and never stops.
#[derive(Debug, Clone)]
pub struct IntervalClock {
    period: Duration,
}

impl IntervalClock {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }
}

#[async_trait]
impl Clock for IntervalClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn tick(&mut self) -> bool {
        debug!("waiting {:?} until next cycle", self.period);
        tokio::time::sleep(self.period).await;
        true
    }
}

/// Frozen clock that allows a fixed number of ticks and advances `now` by
/// `step` on each one.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: DateTime<Utc>,
    step: Duration,
    remaining: usize,
    ticks: usize,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, step: Duration, ticks: usize) -> Self {
        Self {
            now: start,
            step,
            remaining: ticks,
            ticks: 0,
        }
    }

    /// Ticks granted so far.
    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.ticks += 1;
        self.now += chrono::Duration::from_std(self.step).unwrap_or_default();
        true
    }
}
