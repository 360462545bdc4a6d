//! Polling trigger for pages without (or in addition to) a realtime feed.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Interval whose first tick fires one full `period` from now.
///
/// The page does its own load on mount, so an immediate first tick would
/// only duplicate it. Missed ticks are skipped rather than bunched.
pub fn poll_interval(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
