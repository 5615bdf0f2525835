// ELASTIC CLIQUE ENGINE SEAM
// Unified interface the surrounding Clique engine calls into
//
// SAFETY: This trait enforces a contract that every implementation must follow:
// 1. verify_header is deterministic and idempotent (safe to replay on resync)
// 2. seal_timestamp uses the exact same period as verify_header
// 3. No internal state mutations (config is fixed at genesis)

use crate::governor::{self, PeriodDecision, PeriodGovernor};
use crate::sealing;
use crate::validation;
use epoa_core::{ChainConfig, Header};
use thiserror::Error;

/// Header timestamp rejections.
///
/// SAFETY: Every variant is a permanent rejection of that specific header.
/// The producer must build a new header rather than resubmit this one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// Child arrived before the period computed from its parent elapsed
    #[error("Block {number} timestamp {time} too early: parent time {parent_time} + period {period}s")]
    TimestampTooEarly {
        number: u64,
        time: u64,
        parent_time: u64,
        period: u64,
    },

    /// Header timestamp is too far ahead of the local clock
    #[error("Block {number} is in the future: timestamp {time}, local time {now}")]
    FutureBlock { number: u64, time: u64, now: u64 },

    /// Header does not extend the supplied parent
    #[error("Block {number} does not extend parent {parent_number}")]
    UnknownAncestor { number: u64, parent_number: u64 },

    /// Non-genesis header validated without a parent
    #[error("Block {number} has no parent header")]
    MissingParent { number: u64 },
}

/// Integration seam between the governor and a Clique-family engine.
pub trait PeriodEngine: Send + Sync {
    /// The immutable chain configuration.
    fn config(&self) -> &ChainConfig;

    /// Period decision for the child of `parent`.
    fn decide(&self, parent: Option<&Header>) -> PeriodDecision {
        governor::decide(self.config(), parent)
    }

    /// Validate a header's timestamp against its parent and the local clock.
    fn verify_header(
        &self,
        header: &Header,
        parent: Option<&Header>,
        now: u64,
    ) -> Result<(), ConsensusError>;

    /// Timestamp a locally sealed child of `parent` should carry.
    fn seal_timestamp(&self, parent: &Header, now: u64) -> u64;
}

/// Default engine: Clique timestamp rules with the elastic period.
#[derive(Debug, Clone, Copy)]
pub struct ElasticClique {
    governor: PeriodGovernor,
}

impl ElasticClique {
    pub fn new(config: ChainConfig) -> Self {
        ElasticClique {
            governor: PeriodGovernor::new(config),
        }
    }
}

impl PeriodEngine for ElasticClique {
    fn config(&self) -> &ChainConfig {
        self.governor.config()
    }

    fn decide(&self, parent: Option<&Header>) -> PeriodDecision {
        self.governor.decide(parent)
    }

    fn verify_header(
        &self,
        header: &Header,
        parent: Option<&Header>,
        now: u64,
    ) -> Result<(), ConsensusError> {
        validation::verify_header(self.governor.config(), header, parent, now)
    }

    fn seal_timestamp(&self, parent: &Header, now: u64) -> u64 {
        sealing::target_timestamp(self.governor.config(), parent, now)
    }
}
