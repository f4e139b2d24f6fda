//! Wall-clock helper. `Clock` only gives a monotonic `Instant`, which is
//! enough to drive ramps and ticks but can't produce an epoch timestamp for
//! `FrequencyResult::timestamp_ms`/`LiveMetrics`'s `*_start_time` fields, so
//! those reach for `SystemTime` directly rather than going through `Clock`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, saturating at 0 if the system clock is
/// set before 1970 (can't happen in practice, but `duration_since` returns a
/// `Result` either way).
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
