//! Outbound events and the published status snapshot.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits [`KilnEvent`]s
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them: log to serial, push to the
//! dashboard, publish on a message bus.

use crate::config::ControlMode;
use crate::error::{SafetyFault, SensorFault};
use crate::profile::ProfileProgress;

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum KilnEvent {
    /// A run began; samples from now on carry `generation`.
    RunStarted { generation: u32 },

    /// The operator stopped the run.
    RunStopped,

    /// `Start` was refused because a fault is latched.
    StartRefused(SafetyFault),

    /// A profile step was entered (automatically or by command).
    StepEntered {
        index: usize,
        count: usize,
        target_c: f32,
    },

    /// The last step's hold elapsed; the run is over.
    ProfileFinished,

    ProfileLoaded { steps: usize },
    ProfileCleared,

    ModeChanged(ControlMode),

    /// One or more safety faults were latched. Carries the full mask.
    SafetyTripped(u8),

    /// Faults were cleared. Carries the mask that was cleared.
    TripCleared(u8),

    /// The thermocouple stopped producing readings.
    SensorLost(SensorFault),

    /// Readings are valid again.
    SensorRestored,

    TuningApplied,
    ConfigUpdated,
}

/// Point-in-time view of the controller for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    /// Kiln temperature; `None` while the sensor is faulted.
    pub kiln_c: Option<f32>,
    pub board_c: Option<f32>,
    pub setpoint_c: f32,
    /// Duty cycle (0–100 %).
    pub duty: f32,
    pub run_active: bool,
    pub safety_trip: bool,
    pub fault_flags: u8,
    pub heater_on: bool,
    pub sensor_ok: bool,
    pub generation: u32,
    pub mode: ControlMode,
    /// Elapsed and remaining are 0 outside profile mode.
    pub progress: ProfileProgress,
}
