use serde::{Deserialize, Serialize};

/// Block header fields read by the period governor and the timestamp hooks.
///
/// SAFETY INVARIANTS:
/// 1. `gas_used <= gas_limit` is enforced upstream by block execution
/// 2. A header is immutable once received; consensus code only reads it
/// 3. `number == 0` identifies the genesis header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Block height in the chain
    pub number: u64,

    /// Block timestamp (seconds since unix epoch)
    pub time: u64,

    /// Gas consumed by the block's transactions
    pub gas_used: u64,

    /// Gas ceiling of the block
    pub gas_limit: u64,
}

impl Header {
    pub fn new(number: u64, time: u64, gas_used: u64, gas_limit: u64) -> Self {
        Header {
            number,
            time,
            gas_used,
            gas_limit,
        }
    }

    /// Genesis header: height 0, nothing executed.
    pub fn genesis(time: u64, gas_limit: u64) -> Self {
        Header::new(0, time, 0, gas_limit)
    }

    /// Return a copy of this header with different gas accounting.
    pub fn with_gas(mut self, gas_used: u64, gas_limit: u64) -> Self {
        self.gas_used = gas_used;
        self.gas_limit = gas_limit;
        self
    }

    /// Build the header that directly extends this one.
    ///
    /// Gas fields start empty; the block producer fills them after execution.
    pub fn child(&self, time: u64) -> Self {
        Header::new(self.number.saturating_add(1), time, 0, self.gas_limit)
    }

    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}
