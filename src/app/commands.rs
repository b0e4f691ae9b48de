//! Inbound commands to the control loop.
//!
//! These represent actions requested by the outside world (dashboard,
//! serial console, message bus) that the
//! [`ControlLoop`](super::service::ControlLoop) interprets and acts upon.
//! They take effect immediately, between two ticks.

use crate::config::{ControlMode, KilnConfig};
use crate::control::pid::PidParameters;
use crate::error::SafetyFault;
use crate::profile::Profile;

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone)]
pub enum KilnCommand {
    /// Begin heating. Refused while a safety fault is latched.
    Start,

    /// Stop heating; the heater is switched off at once.
    Stop,

    /// New direct-mode setpoint (°C, 0–2000).
    SetSetpoint(f32),

    /// Replace the firing profile. An empty profile clears it.
    ApplyProfile(Profile),

    /// Replace PID gains, output bounds and window without a restart.
    ApplyTuning(PidParameters),

    NextStep,
    PrevStep,
    GotoStep(usize),

    /// Select direct or profile control.
    SetMode(ControlMode),

    /// Latch a safety fault from outside the loop.
    Trip(SafetyFault),

    /// Clear all latched safety faults.
    ClearTrip,

    /// Hot-reload configuration (validated first).
    UpdateConfig(KilnConfig),
}
