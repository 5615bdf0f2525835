//! ePoA: Clique-style Proof-of-Authority with an elastic block period.
//!
//! The period between a parent and its child shrinks toward `minPeriod` as
//! the parent fills its gas limit and grows toward `maxPeriod` when it is
//! empty. The rule is a pure function of the parent header, shared by header
//! validation and local sealing.

pub use epoa_consensus as consensus;
pub use epoa_core as types;

pub use epoa_consensus::{
    calc_period, verify_header, verify_timestamp, ConsensusError, ElasticClique, PeriodEngine,
    SealPlan, SealWait, Sealer,
};
pub use epoa_core::{ChainConfig, ConfigError, GovernorMode, Header};
