//! Time-proportioning window for the solid-state relay.
//!
//! A binary heater approximates an analog power level by being on for the
//! first `duty% × W` milliseconds of every `W`-millisecond window:
//!
//! ```text
//!  duty 35 %, W = 2000 ms
//!  ┌──────┐              ┌──────┐
//!  │ 700  │     1300     │ 700  │     1300
//! ─┘      └──────────────┘      └──────────────
//!  ^ window start         ^ window start
//! ```
//!
//! The window restarts at the call where `now − start ≥ W`. An irregular
//! caller may therefore stretch a window; duty is recomputed every call, so
//! this only shifts phase.

/// Default window length (milliseconds).
pub const DEFAULT_WINDOW_MS: u32 = 2000;

/// Clamp a duty value to 0–100 %, mapping NaN and infinities to 0.
pub fn sanitize_duty(duty: f32) -> f32 {
    if duty.is_finite() {
        duty.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Windowed duty-to-on/off converter.
#[derive(Debug, Clone)]
pub struct WindowDriver {
    window_ms: u64,
    window_start_ms: u64,
    heater_on: bool,
}

impl WindowDriver {
    pub fn new(window_ms: u32, now_ms: u64) -> Self {
        Self {
            window_ms: u64::from(window_ms.max(1)),
            window_start_ms: now_ms,
            heater_on: false,
        }
    }

    /// Decide the heater state for `now_ms`.
    ///
    /// `run_active == false` or `safety_trip == true` force the heater off
    /// regardless of window phase.
    pub fn drive(&mut self, now_ms: u64, duty: f32, run_active: bool, safety_trip: bool) -> bool {
        if now_ms.saturating_sub(self.window_start_ms) >= self.window_ms {
            self.window_start_ms = now_ms;
        }

        let on_ms = self.on_time_ms(duty);
        let phase = now_ms.saturating_sub(self.window_start_ms);
        self.heater_on = run_active && !safety_trip && phase < on_ms;
        self.heater_on
    }

    /// Force the output off without touching the window phase.
    pub fn force_off(&mut self) {
        self.heater_on = false;
    }

    /// Heater on-time inside one window for `duty` percent.
    pub fn on_time_ms(&self, duty: f32) -> u64 {
        (f64::from(sanitize_duty(duty)) * self.window_ms as f64 / 100.0) as u64
    }

    /// Change the window length; takes effect from the next window.
    pub fn set_window_ms(&mut self, window_ms: u32) {
        self.window_ms = u64::from(window_ms.max(1));
    }

    pub fn window_start_ms(&self) -> u64 {
        self.window_start_ms
    }

    pub fn heater_on(&self) -> bool {
        self.heater_on
    }
}
