//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the thermocouple source and the output drivers, exposing them
//! through [`TemperatureSource`] and [`HeaterPort`]. Either output may be
//! absent when the pin configuration marks it as not fitted.
//!
//! The thermocouple transport is a capability held by value, so a pin
//! reassignment is handled here with [`rebind_source`](HardwareAdapter::rebind_source)
//! and the control loop never learns about it.

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::{HeaterPort, TemperatureSource};
use crate::drivers::ssr::SsrDriver;
use crate::drivers::status_led::StatusLed;
use crate::error::{ActuatorError, SensorFault};

/// Concrete adapter that combines the board behind the port traits.
pub struct HardwareAdapter<T, S, L> {
    source: Option<T>,
    ssr: Option<SsrDriver<S>>,
    led: Option<StatusLed<L>>,
}

impl<T, S, L> HardwareAdapter<T, S, L>
where
    T: TemperatureSource,
    S: OutputPin,
    L: OutputPin,
{
    pub fn new(source: T, ssr: Option<SsrDriver<S>>, led: Option<StatusLed<L>>) -> Self {
        if ssr.is_none() {
            warn!("HardwareAdapter: no SSR fitted, heater requests are ignored");
        }
        Self {
            source: Some(source),
            ssr,
            led,
        }
    }

    /// Swap the thermocouple transport (e.g. after a pin change). Returns
    /// the previous one.
    pub fn rebind_source(&mut self, source: T) -> Option<T> {
        info!("HardwareAdapter: temperature source rebound");
        self.source.replace(source)
    }

    /// Drop the transport; reads report [`SensorFault::Unbound`] until a
    /// new one is bound.
    pub fn unbind_source(&mut self) -> Option<T> {
        self.source.take()
    }

    pub fn ssr_available(&self) -> bool {
        self.ssr.is_some()
    }

    pub fn led_available(&self) -> bool {
        self.led.is_some()
    }
}

// ── TemperatureSource implementation ──────────────────────────

impl<T, S, L> TemperatureSource for HardwareAdapter<T, S, L>
where
    T: TemperatureSource,
{
    fn read_kiln(&mut self) -> Result<f32, SensorFault> {
        match self.source.as_mut() {
            Some(src) => src.read_kiln(),
            None => Err(SensorFault::Unbound),
        }
    }

    fn read_board(&mut self) -> Option<f32> {
        self.source.as_mut().and_then(|src| src.read_board())
    }
}

// ── HeaterPort implementation ─────────────────────────────────

impl<T, S, L> HeaterPort for HardwareAdapter<T, S, L>
where
    S: OutputPin,
    L: OutputPin,
{
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError> {
        if let Some(ssr) = self.ssr.as_mut() {
            ssr.set(on)?;
        }
        // The LED is cosmetic; a failed write must not trip the kiln.
        if let Some(led) = self.led.as_mut() {
            if led.show(on).is_err() {
                warn!("HardwareAdapter: status LED write failed");
            }
        }
        Ok(())
    }
}
