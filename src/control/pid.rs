//! PID regulator for kiln temperature
//!
//! Discrete proportional-integral-derivative controller producing the SSR
//! duty cycle (percent). The elapsed time is measured on every call, so
//! the regulator stays correct when the superloop runs at an irregular
//! cadence.
//!
//! - The integral term is accumulated already scaled by `Ki` and clamped
//!   to the output bounds, so retuning `Ki` mid-fire does not bump the
//!   output and saturation cannot wind the integrator up.
//! - The derivative acts on the measurement, not the error, so a setpoint
//!   step (profile advance) produces no derivative kick.
//! - [`PidRegulator::hold`] freezes the integrator while feedback is
//!   missing.

/// Tuning and output shaping, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidParameters {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub out_min: f32,
    pub out_max: f32,
    /// SSR window length in milliseconds (consumed by the window driver).
    pub window_ms: u32,
}

impl PidParameters {
    /// Finite gains, `out_min < out_max`, non-zero window.
    pub fn is_valid(&self) -> bool {
        [self.kp, self.ki, self.kd, self.out_min, self.out_max]
            .iter()
            .all(|v| v.is_finite())
            && self.out_min < self.out_max
            && self.window_ms > 0
    }
}

/// PID regulator
pub struct PidRegulator {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    /// Integral term, already multiplied by `ki`.
    integral: f32,
    prev_input: Option<f32>,
    last_ms: Option<u64>,
    output_min: f32,
    output_max: f32,
    output: f32,
}

impl PidRegulator {
    pub fn new(params: &PidParameters, setpoint: f32) -> Self {
        Self {
            kp: params.kp,
            ki: params.ki,
            kd: params.kd,
            setpoint,
            integral: 0.0,
            prev_input: None,
            last_ms: None,
            output_min: params.out_min,
            output_max: params.out_max,
            output: params.out_min,
        }
    }

    /// Replace gains and output bounds without a restart.
    ///
    /// The accumulated integral is kept and re-clamped into the new bounds.
    pub fn set_tunings(&mut self, params: &PidParameters) {
        self.kp = params.kp;
        self.ki = params.ki;
        self.kd = params.kd;
        self.set_limits(params.out_min, params.out_max);
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
        self.integral = self.integral.clamp(min, max);
        self.output = self.output.clamp(min, max);
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// Last computed output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Compute the output for a valid measurement taken at `now_ms`.
    ///
    /// The first call after construction, [`reset`](Self::reset) or
    /// [`hold`](Self::hold) has no time base: it returns the proportional
    /// and integral terms only.
    pub fn compute(&mut self, measurement: f32, now_ms: u64) -> f32 {
        let dt = self
            .last_ms
            .map_or(0.0, |last| now_ms.saturating_sub(last) as f32 / 1000.0);
        self.last_ms = Some(now_ms);

        let error = self.setpoint - measurement;

        // Proportional
        let p = self.kp * error;

        // Integral (clamped to the output range)
        if dt > 0.0 {
            self.integral =
                (self.integral + self.ki * error * dt).clamp(self.output_min, self.output_max);
        }

        // Derivative on measurement
        let d = match self.prev_input {
            Some(prev) if dt > 0.0 => -self.kd * (measurement - prev) / dt,
            _ => 0.0,
        };
        self.prev_input = Some(measurement);

        let output = p + self.integral + d;
        self.output = if output.is_finite() {
            output.clamp(self.output_min, self.output_max)
        } else {
            self.output_min
        };
        self.output
    }

    /// Feedback is unavailable: stop the clock so no error is integrated
    /// across the gap, and drop derivative history so the first reading
    /// after recovery does not produce a spike.
    pub fn hold(&mut self) {
        self.last_ms = None;
        self.prev_input = None;
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_input = None;
        self.last_ms = None;
        self.output = self.output_min;
    }

    /// Current integral contribution (for diagnostics and tests).
    pub fn integral(&self) -> f32 {
        self.integral
    }
}
