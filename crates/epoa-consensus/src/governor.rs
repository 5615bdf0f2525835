// ELASTIC PERIOD GOVERNOR
// Computes the minimum interval between a parent block and its child
//
// SAFETY INVARIANTS:
// 1. Pure function of (config, parent header); no state, no I/O, no logging
// 2. Integer-only arithmetic so every node computes the identical period
// 3. Total: every input yields a period, degenerate inputs fall back to `period`
// 4. Enabled governor output always lies in [min_period, max_period]
//
// Rounding rule (consensus-critical):
//   utilization  U = floor(gas_used * 100 / gas_limit), clamped to 100
//   U >= target  -> min_period
//   U <  target  -> max_period - floor(U * (max_period - min_period) / target)

use epoa_core::{ChainConfig, GovernorMode, Header};
use serde::{Deserialize, Serialize};

/// Which rule produced a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodRegime {
    /// Fixed `period` (governor disabled, malformed, or utilization undefined)
    Fallback,
    /// Period at the `max_period` ceiling (idle network)
    Eco,
    /// Period strictly between the bounds
    Scaled,
    /// Period at the `min_period` floor (loaded network)
    Burst,
}

impl PeriodRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodRegime::Fallback => "FALLBACK",
            PeriodRegime::Eco => "ECO",
            PeriodRegime::Scaled => "SCALED",
            PeriodRegime::Burst => "BURST",
        }
    }
}

/// A computed period together with the inputs that explain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDecision {
    /// Seconds that must elapse after the parent timestamp
    pub period: u64,

    /// Parent utilization in percent, when it was defined
    pub utilization: Option<u64>,

    pub regime: PeriodRegime,
}

impl PeriodDecision {
    fn fallback(config: &ChainConfig) -> Self {
        PeriodDecision {
            period: config.period,
            utilization: None,
            regime: PeriodRegime::Fallback,
        }
    }
}

/// Gas utilization of a block in whole percent, truncated and clamped to 100.
///
/// Returns `None` when `gas_limit` is zero.
pub fn utilization_percent(gas_used: u64, gas_limit: u64) -> Option<u64> {
    if gas_limit == 0 {
        return None;
    }
    let percent = (gas_used as u128 * 100) / gas_limit as u128;
    Some(percent.min(100) as u64)
}

/// Decide the period for the child of `parent`.
pub fn decide(config: &ChainConfig, parent: Option<&Header>) -> PeriodDecision {
    if config.governor_mode() != GovernorMode::Enabled {
        return PeriodDecision::fallback(config);
    }

    let parent = match parent {
        Some(parent) if !parent.is_genesis() => parent,
        _ => return PeriodDecision::fallback(config),
    };

    let utilization = match utilization_percent(parent.gas_used, parent.gas_limit) {
        Some(utilization) => utilization,
        None => return PeriodDecision::fallback(config),
    };

    let period = interpolate(config, utilization);
    let regime = if period == config.min_period {
        PeriodRegime::Burst
    } else if period == config.max_period {
        PeriodRegime::Eco
    } else {
        PeriodRegime::Scaled
    };

    PeriodDecision {
        period,
        utilization: Some(utilization),
        regime,
    }
}

/// Period in seconds for the child of `parent`.
pub fn calc_period(config: &ChainConfig, parent: Option<&Header>) -> u64 {
    decide(config, parent).period
}

// Requires an enabled config: 0 < target <= 100 and min <= max.
fn interpolate(config: &ChainConfig, utilization: u64) -> u64 {
    let target = config.target_utilization;
    if utilization >= target {
        return config.min_period;
    }

    let span = (config.max_period - config.min_period) as u128;
    let reduction = (utilization as u128 * span) / target as u128;
    let period = config.max_period - reduction as u64;

    period.clamp(config.min_period, config.max_period)
}

/// Period governor bound to one chain configuration.
///
/// Holds the configuration by value; cheap to copy into every validation
/// thread and sealing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodGovernor {
    config: ChainConfig,
}

impl PeriodGovernor {
    pub fn new(config: ChainConfig) -> Self {
        PeriodGovernor { config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn decide(&self, parent: Option<&Header>) -> PeriodDecision {
        decide(&self.config, parent)
    }
}
