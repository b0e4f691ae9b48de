//! Heater status LED.
//!
//! The board's LED sinks current into the GPIO, so it lights when the pin
//! is driven **low**. [`StatusLed::show`] takes the logical state and
//! inverts it on the way out.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;

pub struct StatusLed<P> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Take ownership of `pin` with the LED dark.
    pub fn new(mut pin: P) -> Result<Self, ActuatorError> {
        pin.set_high().map_err(|_| ActuatorError::PinWriteFailed)?;
        Ok(Self { pin, lit: false })
    }

    pub fn show(&mut self, lit: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(PinState::from(!lit))
            .map_err(|_| ActuatorError::PinWriteFailed)?;
        self.lit = lit;
        Ok(())
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
