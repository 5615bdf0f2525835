// Validation and proposal hooks working against the same chain.

use epoa_consensus::{Clock, ConsensusError, ElasticClique, PeriodEngine, SealWait, Sealer};
use epoa_core::{ChainConfig, Header};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const GAS_LIMIT: u64 = 30_000_000;

/// Clock that follows tokio's paused time from a unix starting point.
struct TestClock {
    start_unix: u64,
    start: tokio::time::Instant,
}

impl TestClock {
    fn new(start_unix: u64) -> Self {
        TestClock {
            start_unix,
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TestClock {
    fn now(&self) -> u64 {
        self.start_unix + self.start.elapsed().as_secs()
    }
}

fn elastic() -> ChainConfig {
    ChainConfig::new(5, 30000).unwrap().with_governor(2, 12, 50)
}

#[test]
fn test_validation_hook_end_to_end() {
    // Fixed period 5 and an elastic config whose parent maps to 5 both behave alike.
    let fixed = ElasticClique::new(ChainConfig::new(5, 30000).unwrap());
    let scaled = ElasticClique::new(ChainConfig::new(9, 30000).unwrap().with_governor(0, 10, 100));

    let parent = Header::new(20, 1000, GAS_LIMIT / 2, GAS_LIMIT);
    assert_eq!(scaled.decide(Some(&parent)).period, 5);

    for engine in [&fixed as &dyn PeriodEngine, &scaled as &dyn PeriodEngine] {
        assert!(matches!(
            engine.verify_header(&parent.child(1004), Some(&parent), 1004),
            Err(ConsensusError::TimestampTooEarly { period: 5, .. })
        ));
        assert!(engine.verify_header(&parent.child(1005), Some(&parent), 1005).is_ok());
        assert!(engine.verify_header(&parent.child(1006), Some(&parent), 1006).is_ok());
    }
}

#[tokio::test(start_paused = true)]
async fn test_sealed_chain_validates_on_peer() {
    let config = elastic();
    let clock = Arc::new(TestClock::new(1_700_000_000));
    let sealer = Sealer::with_clock(config, clock.clone());
    let peer = ElasticClique::new(config);

    let mut chain = vec![Header::genesis(1_700_000_000, GAS_LIMIT)];
    let load = [100u64, 0, 25, 80, 10, 50, 0];

    for percent in load {
        let parent = *chain.last().unwrap();
        let header = sealer
            .next_header(&parent, &CancellationToken::new())
            .await
            .expect("seal wait was not cancelled")
            .with_gas(GAS_LIMIT / 100 * percent, GAS_LIMIT);

        peer.verify_header(&header, Some(&parent), clock.now()).unwrap();
        chain.push(header);
    }

    assert!(epoa_consensus::verify_chain(&config, &chain, clock.now()).is_ok());

    // Spacing follows the parent's load: idle parents give 12s, full parents 2s.
    let gaps: Vec<u64> = chain.windows(2).map(|w| w[1].time - w[0].time).collect();
    assert_eq!(gaps, vec![5, 2, 12, 7, 2, 10, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_seal_produces_nothing() {
    let clock = Arc::new(TestClock::new(1_700_000_000));
    let sealer = Sealer::with_clock(elastic(), clock.clone());
    let parent = Header::new(3, 1_700_000_000, 0, GAS_LIMIT);

    let plan = sealer.prepare(&parent);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let waiter = tokio::spawn(async move { sealer.wait(&plan, &cancel).await });

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    trigger.cancel();
    assert_eq!(waiter.await.unwrap(), SealWait::Cancelled);
}

#[test]
fn test_future_header_rejected_by_engine() {
    let engine = ElasticClique::new(elastic());

    let parent = Header::new(1, 900, 0, GAS_LIMIT);
    let header = parent.child(2000);
    assert!(matches!(
        engine.verify_header(&header, Some(&parent), 1000),
        Err(ConsensusError::FutureBlock { .. })
    ));
}
