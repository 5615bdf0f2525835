pub mod chain_config;
pub mod header;

pub use chain_config::{ChainConfig, ConfigError, GovernorMode, MalformedReason};
pub use header::Header;
