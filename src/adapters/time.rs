//! Monotonic time adapter.
//!
//! The control loop only ever sees `u64` milliseconds since boot. On the
//! host this wraps `std::time::Instant`.

use std::time::Instant;

pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
