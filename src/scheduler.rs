//! Timestamp-based pacing for the cooperative superloop.
//!
//! Nothing in the control tick sleeps.  Work that must run at a slower
//! cadence than the tick itself (thermocouple reads, history samples) asks
//! an [`Interval`] whether it is due, and the interval answers by comparing
//! timestamps.
//!
//! ```text
//!  tick ─▶ tick ─▶ tick ─▶ tick ─▶ tick ─▶ tick
//!   │                        │
//!   └── due ──────period────▶└── due
//! ```

/// A fixed-period gate over a monotonic millisecond clock.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u64,
    /// Timestamp of the last time the gate opened; `None` until the first poll.
    last_ms: Option<u64>,
}

impl Interval {
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    /// Returns `true` (and re-arms) when at least one period has passed
    /// since the gate last opened.  The first poll is always due.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.saturating_sub(last) < self.period_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }

    /// Change the period without losing the phase of the last firing.
    pub fn set_period(&mut self, period_ms: u64) {
        self.period_ms = period_ms;
    }

    /// Forget the last firing so the next poll is due immediately.
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
