//! Solid-state relay driver.
//!
//! The SSR input is active high: a high GPIO energises the heating
//! element. The driver is generic over any `embedded-hal` output pin, so
//! the same code runs on the board and against a recording pin in tests.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::error::ActuatorError;

pub struct SsrDriver<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> SsrDriver<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_low().map_err(|_| ActuatorError::PinWriteFailed)?;
        Ok(Self { pin, on: false })
    }

    /// Energise or release the relay. On a failed write the driver
    /// assumes the relay is off.
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => {
                self.on = on;
                Ok(())
            }
            Err(_) => {
                error!("SSR pin write failed (requested {})", on);
                self.on = false;
                Err(ActuatorError::PinWriteFailed)
            }
        }
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set(false)
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Release the underlying pin.
    pub fn release(self) -> P {
        self.pin
    }
}
