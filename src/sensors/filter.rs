//! Exponential moving average for the kiln temperature.

/// Single-pole low-pass filter. `alpha` is the weight of each new sample;
/// `alpha == 1.0` passes readings through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f32,
    value: Option<f32>,
}

impl Ema {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::MIN_POSITIVE, 1.0),
            value: None,
        }
    }

    /// Feed a sample and return the filtered value. The first sample after
    /// construction or [`reset`](Self::reset) seeds the filter unfiltered.
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            Some(prev) => prev + self.alpha * (sample - prev),
            None => sample,
        };
        self.value = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(f32::MIN_POSITIVE, 1.0);
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }
}
