//! Spacing between send attempts.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Decides how long to wait before the next send attempt.
///
/// [`Pacing::wait_turn`] is awaited right before an attempt and
/// [`Pacing::record_attempt`] is called once it has finished. Contacts that
/// are skipped never touch the policy.
#[allow(async_fn_in_trait)]
pub trait Pacing {
    /// Waits until the next attempt may start.
    async fn wait_turn(&mut self);

    /// Notes that an attempt has just completed.
    fn record_attempt(&mut self);
}

/// Keeps at least `interval` between the end of one attempt and the start of
/// the next. The first attempt starts immediately and nothing is waited
/// after the last one.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl FixedInterval {
    /// Creates a policy with the given interval.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    /// The configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Pacing for FixedInterval {
    async fn wait_turn(&mut self) {
        let Some(last) = self.last_attempt else {
            return;
        };
        let next = last + self.interval;
        if Instant::now() < next {
            trace!(wait = ?next.saturating_duration_since(Instant::now()), "Pacing");
            tokio::time::sleep_until(next).await;
        }
    }

    fn record_attempt(&mut self) {
        self.last_attempt = Some(Instant::now());
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacing for NoDelay {
    async fn wait_turn(&mut self) {}

    fn record_attempt(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_turn_is_immediate() {
        let mut pacing = FixedInterval::new(Duration::from_secs(2));
        let start = Instant::now();
        pacing.wait_turn().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_interval_after_attempt() {
        let mut pacing = FixedInterval::new(Duration::from_secs(2));
        pacing.wait_turn().await;
        pacing.record_attempt();

        let start = Instant::now();
        pacing.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn time_already_spent_counts() {
        let mut pacing = FixedInterval::new(Duration::from_secs(2));
        pacing.record_attempt();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        pacing.wait_turn().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_never_waits() {
        let mut pacing = NoDelay;
        let start = Instant::now();
        for _ in 0..3 {
            pacing.wait_turn().await;
            pacing.record_attempt();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
