// CHAIN CONFIGURATION
// Clique section of the genesis file, extended with the elastic period tunables
//
// SAFETY INVARIANTS:
// 1. Loaded once at genesis and never mutated afterwards
// 2. All nodes of a network must load identical values (divergence splits the chain)
// 3. A malformed governor section never fails loading; it degrades to the fixed period

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading the chain configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Genesis file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Genesis JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Genesis has no clique section")]
    MissingClique,

    #[error("epoch must be > 0")]
    ZeroEpoch,
}

/// Why a governor section was rejected in favour of the fixed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedReason {
    /// Target utilization is zero while another tunable is set
    ZeroTarget,
    /// Target utilization above 100 percent
    TargetOutOfRange,
    /// minPeriod is greater than maxPeriod
    InvertedBounds,
    /// maxPeriod is zero while the governor is otherwise configured
    ZeroCeiling,
}

impl MalformedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedReason::ZeroTarget => "targetUtilization is zero",
            MalformedReason::TargetOutOfRange => "targetUtilization exceeds 100",
            MalformedReason::InvertedBounds => "minPeriod exceeds maxPeriod",
            MalformedReason::ZeroCeiling => "maxPeriod is zero",
        }
    }
}

/// How the period governor treats a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernorMode {
    /// All tunables unset: fixed-period Clique behaviour
    Disabled,
    /// Tunables valid: the period follows parent utilization
    Enabled,
    /// Tunables set but unusable: fixed-period behaviour
    Malformed(MalformedReason),
}

impl GovernorMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, GovernorMode::Enabled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GovernorMode::Disabled => "DISABLED",
            GovernorMode::Enabled => "ENABLED",
            GovernorMode::Malformed(_) => "MALFORMED",
        }
    }
}

/// Clique consensus parameters with the elastic period extension.
///
/// The JSON form uses the genesis key names: `period`, `epoch`, `minPeriod`,
/// `maxPeriod`, `targetUtilization`. The three governor tunables default to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Fixed (fallback) period in seconds
    pub period: u64,

    /// Signer checkpoint interval in blocks
    pub epoch: u64,

    /// Burst-mode floor in seconds
    #[serde(default)]
    pub min_period: u64,

    /// Eco-mode ceiling in seconds
    #[serde(default)]
    pub max_period: u64,

    /// Utilization (percent) at which the period reaches `min_period`
    #[serde(default)]
    pub target_utilization: u64,
}

impl ChainConfig {
    /// Create a fixed-period configuration (governor disabled).
    pub fn new(period: u64, epoch: u64) -> Result<Self, ConfigError> {
        if epoch == 0 {
            return Err(ConfigError::ZeroEpoch);
        }
        Ok(ChainConfig {
            period,
            epoch,
            min_period: 0,
            max_period: 0,
            target_utilization: 0,
        })
    }

    /// Return a copy with the governor tunables set.
    pub fn with_governor(mut self, min_period: u64, max_period: u64, target_utilization: u64) -> Self {
        self.min_period = min_period;
        self.max_period = max_period;
        self.target_utilization = target_utilization;
        self
    }

    /// Classify the governor tunables.
    ///
    /// SAFETY: Pure and deterministic; every node classifies identically.
    pub fn governor_mode(&self) -> GovernorMode {
        if self.min_period == 0 && self.max_period == 0 && self.target_utilization == 0 {
            return GovernorMode::Disabled;
        }
        if self.target_utilization == 0 {
            return GovernorMode::Malformed(MalformedReason::ZeroTarget);
        }
        if self.target_utilization > 100 {
            return GovernorMode::Malformed(MalformedReason::TargetOutOfRange);
        }
        if self.min_period > self.max_period {
            return GovernorMode::Malformed(MalformedReason::InvertedBounds);
        }
        if self.max_period == 0 {
            return GovernorMode::Malformed(MalformedReason::ZeroCeiling);
        }
        GovernorMode::Enabled
    }

    /// Parse a genesis document.
    ///
    /// Accepts a full genesis (`{"config": {"clique": {..}}}`), a chain config
    /// object (`{"clique": {..}}`) or a bare clique object.
    pub fn from_genesis_json(json: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(json)?;
        let chain = root.get("config").unwrap_or(&root);
        let clique = match chain.get("clique") {
            Some(section) => section.clone(),
            None if chain.get("period").is_some() => chain.clone(),
            None => return Err(ConfigError::MissingClique),
        };

        let config: ChainConfig = serde_json::from_value(clique)?;
        if config.epoch == 0 {
            return Err(ConfigError::ZeroEpoch);
        }

        if let GovernorMode::Malformed(reason) = config.governor_mode() {
            log::warn!(
                "Elastic period governor disabled ({}); using fixed period {}s",
                reason.as_str(),
                config.period
            );
        }

        Ok(config)
    }

    /// Read and parse a genesis file.
    pub fn from_genesis_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_genesis_json(&json)
    }
}
