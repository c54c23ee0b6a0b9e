//! Helpers for structured timing events.

use std::time::Instant;

/// Milliseconds since `started`, saturating at `u64::MAX`.
pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
