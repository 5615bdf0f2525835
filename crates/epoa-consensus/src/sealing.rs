// SEAL TIMING
// Timestamp and wait for a locally produced block
//
// SAFETY INVARIANTS:
// 1. Uses the same governor call as validation, so local blocks pass peer checks
// 2. target >= parent.time + period, and target >= now
// 3. The wait is cancellable; the sealing loop cancels it when a better chain arrives

use crate::governor::{self, PeriodRegime};
use chrono::Utc;
use epoa_core::{ChainConfig, Header};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Earliest timestamp a child of `parent` may carry, never earlier than `now`.
pub fn target_timestamp(config: &ChainConfig, parent: &Header, now: u64) -> u64 {
    earliest_timestamp(parent, governor::calc_period(config, Some(parent)), now)
}

fn earliest_timestamp(parent: &Header, period: u64, now: u64) -> u64 {
    parent.time.saturating_add(period).max(now)
}

/// Time left until `target`; zero once it has been reached.
pub fn seal_delay(target: u64, now: u64) -> Duration {
    Duration::from_secs(target.saturating_sub(now))
}

/// Wall-clock source in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Timing of the next local block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealPlan {
    /// Height of the block being sealed
    pub number: u64,

    /// Timestamp the sealed header must carry
    pub timestamp: u64,

    pub period: u64,
    pub utilization: Option<u64>,
    pub regime: PeriodRegime,

    /// Wait remaining when the plan was made
    pub delay: Duration,
}

/// Outcome of waiting for a seal slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealWait {
    /// Target timestamp reached; the block may be sealed now
    Ready,
    /// Wait was interrupted by the sealing loop
    Cancelled,
}

/// Computes seal plans and waits for them.
pub struct Sealer<C: Clock = SystemClock> {
    config: ChainConfig,
    clock: C,
}

impl Sealer<SystemClock> {
    pub fn new(config: ChainConfig) -> Self {
        Sealer::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Sealer<C> {
    pub fn with_clock(config: ChainConfig, clock: C) -> Self {
        Sealer { config, clock }
    }

    /// Plan the child of `parent`.
    pub fn prepare(&self, parent: &Header) -> SealPlan {
        let now = self.clock.now();
        let decision = governor::decide(&self.config, Some(parent));
        let timestamp = earliest_timestamp(parent, decision.period, now);

        info!(
            parent = parent.number,
            utilization = ?decision.utilization,
            period = decision.period,
            regime = decision.regime.as_str(),
            "planned block seal"
        );

        SealPlan {
            number: parent.number.saturating_add(1),
            timestamp,
            period: decision.period,
            utilization: decision.utilization,
            regime: decision.regime,
            delay: seal_delay(timestamp, now),
        }
    }

    /// Suspend until the plan's timestamp is reached or `cancel` fires.
    pub async fn wait(&self, plan: &SealPlan, cancel: &CancellationToken) -> SealWait {
        if cancel.is_cancelled() {
            return SealWait::Cancelled;
        }

        let delay = seal_delay(plan.timestamp, self.clock.now());
        if delay.is_zero() {
            return SealWait::Ready;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Seal wait for block {} cancelled", plan.number);
                SealWait::Cancelled
            }
            _ = tokio::time::sleep(delay) => SealWait::Ready,
        }
    }

    /// Plan, wait, and return the header to seal, or `None` if cancelled.
    pub async fn next_header(&self, parent: &Header, cancel: &CancellationToken) -> Option<Header> {
        let plan = self.prepare(parent);
        match self.wait(&plan, cancel).await {
            SealWait::Ready => Some(parent.child(plan.timestamp)),
            SealWait::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    fn elastic() -> ChainConfig {
        ChainConfig::new(5, 30000).unwrap().with_governor(2, 12, 50)
    }

    #[test]
    fn test_target_timestamp_floor() {
        let config = elastic();
        let parent = Header::new(10, 1000, 0, 30_000_000);
        assert_eq!(target_timestamp(&config, &parent, 900), 1012);
        assert_eq!(target_timestamp(&config, &parent, 1500), 1500);
    }

    #[test]
    fn test_seal_delay() {
        assert_eq!(seal_delay(1012, 1000), Duration::from_secs(12));
        assert_eq!(seal_delay(1012, 1012), Duration::ZERO);
        assert_eq!(seal_delay(1012, 2000), Duration::ZERO);
    }

    #[test]
    fn test_prepare_matches_target_timestamp() {
        let config = elastic();
        for now in [900u64, 1003, 1007, 1500] {
            for percent in [0u64, 25, 60] {
                let parent = Header::new(10, 1000, 300_000 * percent, 30_000_000);
                let plan = Sealer::with_clock(config, FixedClock(now)).prepare(&parent);
                assert_eq!(plan.timestamp, target_timestamp(&config, &parent, now));
            }
        }
    }

    #[test]
    fn test_prepare_plan() {
        let sealer = Sealer::with_clock(elastic(), FixedClock(1001));
        let parent = Header::new(10, 1000, 7_500_000, 30_000_000);
        let plan = sealer.prepare(&parent);
        assert_eq!(plan.number, 11);
        assert_eq!(plan.timestamp, 1007);
        assert_eq!(plan.period, 7);
        assert_eq!(plan.utilization, Some(25));
        assert_eq!(plan.regime, PeriodRegime::Scaled);
        assert_eq!(plan.delay, Duration::from_secs(6));
    }

    #[test]
    fn test_planned_header_passes_validation() {
        let config = elastic();
        for percent in [0u64, 10, 25, 49, 50, 75, 100] {
            let parent = Header::new(10, 1000, 300_000 * percent, 30_000_000);
            let sealer = Sealer::with_clock(config, FixedClock(1000));
            let plan = sealer.prepare(&parent);
            let child = parent.child(plan.timestamp);
            assert_eq!(
                validation::verify_timestamp(&config, &child, &parent),
                Ok(plan.period)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_target() {
        let sealer = Sealer::with_clock(elastic(), FixedClock(1000));
        let parent = Header::new(10, 1000, 0, 30_000_000);
        let plan = sealer.prepare(&parent);
        let cancel = CancellationToken::new();

        let started = tokio::time::Instant::now();
        assert_eq!(sealer.wait(&plan, &cancel).await, SealWait::Ready);
        assert!(started.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_ready_immediately_when_late() {
        let sealer = Sealer::with_clock(elastic(), FixedClock(5000));
        let parent = Header::new(10, 1000, 0, 30_000_000);
        let plan = sealer.prepare(&parent);
        assert_eq!(plan.timestamp, 5000);

        let started = tokio::time::Instant::now();
        assert_eq!(sealer.wait(&plan, &CancellationToken::new()).await, SealWait::Ready);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_by_better_chain() {
        let sealer = Sealer::with_clock(elastic(), FixedClock(1000));
        let parent = Header::new(10, 1000, 0, 30_000_000);
        let plan = sealer.prepare(&parent);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        assert_eq!(sealer.wait(&plan, &cancel).await, SealWait::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_header() {
        let sealer = Sealer::with_clock(elastic(), FixedClock(1000));
        let parent = Header::new(10, 1000, 30_000_000, 30_000_000);

        let header = sealer.next_header(&parent, &CancellationToken::new()).await;
        assert_eq!(header, Some(parent.child(1002)));

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        assert_eq!(sealer.next_header(&parent, &cancelled).await, None);
    }
}
