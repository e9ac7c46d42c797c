//! Process-global monotonic time base.

use std::sync::OnceLock;
use std::time::Instant;

/// Espresso time-base frequency: one quarter of the 248.625 MHz bus clock.
pub const TIMEBASE_HZ: u64 = 62_156_250;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Time-base ticks elapsed since the process first asked.
pub fn now() -> u64 {
    let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
    elapsed.as_secs() * TIMEBASE_HZ + u64::from(elapsed.subsec_nanos()) * TIMEBASE_HZ / 1_000_000_000
}
