// HEADER TIMESTAMP VALIDATION
// Accept/reject a header's timestamp when it extends the chain
//
// SAFETY INVARIANTS:
// 1. A child is valid only if child.time >= parent.time + calc_period(parent)
// 2. Validation reads only the config and the two headers (replay-safe on resync)
// 3. The future-block bound is independent of the governor

use crate::engine::ConsensusError;
use crate::governor;
use epoa_core::{ChainConfig, Header};
use tracing::debug;

/// Seconds a header may run ahead of the local clock.
pub const ALLOWED_FUTURE_BLOCK_TIME: u64 = 15;

/// Check a header's timestamp against the period computed from its parent.
///
/// Returns the period that was enforced.
pub fn verify_timestamp(
    config: &ChainConfig,
    header: &Header,
    parent: &Header,
) -> Result<u64, ConsensusError> {
    let decision = governor::decide(config, Some(parent));
    let earliest = parent.time.saturating_add(decision.period);

    debug!(
        parent = parent.number,
        utilization = ?decision.utilization,
        period = decision.period,
        regime = decision.regime.as_str(),
        "validated block period"
    );

    if header.time < earliest {
        return Err(ConsensusError::TimestampTooEarly {
            number: header.number,
            time: header.time,
            parent_time: parent.time,
            period: decision.period,
        });
    }

    Ok(decision.period)
}

/// Reject headers stamped too far ahead of `now`.
pub fn verify_future(header: &Header, now: u64) -> Result<(), ConsensusError> {
    if header.time > now.saturating_add(ALLOWED_FUTURE_BLOCK_TIME) {
        return Err(ConsensusError::FutureBlock {
            number: header.number,
            time: header.time,
            now,
        });
    }
    Ok(())
}

/// Ensure `header` sits directly on top of `parent`.
pub fn verify_ancestry(header: &Header, parent: &Header) -> Result<(), ConsensusError> {
    if parent.number.checked_add(1) != Some(header.number) {
        return Err(ConsensusError::UnknownAncestor {
            number: header.number,
            parent_number: parent.number,
        });
    }
    Ok(())
}

/// Full timestamp validation of a header extending the chain.
///
/// A genesis header with no parent is accepted as-is.
pub fn verify_header(
    config: &ChainConfig,
    header: &Header,
    parent: Option<&Header>,
    now: u64,
) -> Result<(), ConsensusError> {
    if header.is_genesis() && parent.is_none() {
        return Ok(());
    }

    verify_future(header, now)?;

    let parent = parent.ok_or(ConsensusError::MissingParent {
        number: header.number,
    })?;
    verify_ancestry(header, parent)?;
    verify_timestamp(config, header, parent)?;

    Ok(())
}

/// Re-validate a contiguous run of headers, oldest first.
///
/// The first header is trusted as the anchor unless it is genesis.
pub fn verify_chain(config: &ChainConfig, headers: &[Header], now: u64) -> Result<(), ConsensusError> {
    for pair in headers.windows(2) {
        verify_header(config, &pair[1], Some(&pair[0]), now)?;
    }

    if let (Some(first), Some(last)) = (headers.first(), headers.last()) {
        log::info!(
            "Verified header timestamps {}..={} ({} headers)",
            first.number,
            last.number,
            headers.len()
        );
    }

    Ok(())
}
