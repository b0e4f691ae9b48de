//! Simulated kiln: a first-order thermal plant for the host build.
//!
//! ```text
//!  dT/dt = heat_rate · heater − loss · (T − ambient)
//! ```
//!
//! Implements both [`TemperatureSource`] and [`HeaterPort`], so it can
//! stand in for the whole board. The host advances it explicitly with
//! [`advance`](SimulatedKiln::advance) before each tick; nothing here reads
//! a clock.

use crate::app::ports::{HeaterPort, TemperatureSource};
use crate::error::{ActuatorError, SensorFault};

/// Plant coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KilnModel {
    pub ambient_c: f32,
    /// Temperature rise per second at full power, ignoring losses.
    pub heat_rate_c_per_s: f32,
    /// Fraction of the temperature difference to ambient lost per second.
    pub loss_per_s: f32,
}

impl Default for KilnModel {
    fn default() -> Self {
        Self {
            ambient_c: 20.0,
            heat_rate_c_per_s: 2.5,
            loss_per_s: 0.0015,
        }
    }
}

pub struct SimulatedKiln {
    model: KilnModel,
    temp_c: f32,
    heater_on: bool,
    last_ms: Option<u64>,
    fault: Option<SensorFault>,
    heater_on_ms: u64,
}

impl SimulatedKiln {
    pub fn new(model: KilnModel) -> Self {
        Self {
            temp_c: model.ambient_c,
            model,
            heater_on: false,
            last_ms: None,
            fault: None,
            heater_on_ms: 0,
        }
    }

    /// Integrate the plant up to `now_ms` with the current heater state.
    pub fn advance(&mut self, now_ms: u64) {
        let Some(last) = self.last_ms.replace(now_ms) else {
            return;
        };
        let dt_ms = now_ms.saturating_sub(last);
        if self.heater_on {
            self.heater_on_ms += dt_ms;
        }
        let dt = dt_ms as f32 / 1000.0;
        let heat = if self.heater_on {
            self.model.heat_rate_c_per_s
        } else {
            0.0
        };
        let loss = self.model.loss_per_s * (self.temp_c - self.model.ambient_c);
        self.temp_c += (heat - loss) * dt;
    }

    /// Make subsequent reads fail with `fault` (`None` heals the probe).
    pub fn inject_fault(&mut self, fault: Option<SensorFault>) {
        self.fault = fault;
    }

    pub fn temperature_c(&self) -> f32 {
        self.temp_c
    }

    pub fn heater_on(&self) -> bool {
        self.heater_on
    }

    /// Total time the element has been energised.
    pub fn heater_on_ms(&self) -> u64 {
        self.heater_on_ms
    }
}

impl TemperatureSource for SimulatedKiln {
    fn read_kiln(&mut self) -> Result<f32, SensorFault> {
        match self.fault {
            Some(fault) => Err(fault),
            None => Ok(self.temp_c),
        }
    }

    fn read_board(&mut self) -> Option<f32> {
        Some(self.model.ambient_c + 5.0)
    }
}

impl HeaterPort for SimulatedKiln {
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.heater_on = on;
        Ok(())
    }
}
