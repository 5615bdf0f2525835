pub mod engine;
pub mod governor;
pub mod sealing;
pub mod validation;

pub use engine::{ConsensusError, ElasticClique, PeriodEngine};
pub use governor::{calc_period, decide, utilization_percent, PeriodDecision, PeriodGovernor, PeriodRegime};
pub use sealing::{seal_delay, target_timestamp, Clock, SealPlan, SealWait, Sealer, SystemClock};
pub use validation::{verify_chain, verify_header, verify_timestamp, ALLOWED_FUTURE_BLOCK_TIME};
