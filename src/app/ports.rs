//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (thermocouple, heater output, event sinks, config
//! storage) implement these traits. The [`ControlLoop`](super::service::ControlLoop)
//! consumes them via generics, so the domain core never touches hardware
//! directly and a sensor can be rebound by the host without the core
//! noticing.
//!
//! ## Safety notes
//!
//! - **HeaterPort** implementations MUST leave the heater de-energised when
//!   a write fails part-way.
//! - **ConfigPort** implementations MUST validate before persisting.

use crate::config::KilnConfig;
use crate::error::{ActuatorError, SensorFault};

// ───────────────────────────────────────────────────────────────
// Temperature port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the narrow "read temperature" capability of the
/// thermocouple converter.
pub trait TemperatureSource {
    /// One physical read of the thermocouple junction (°C).
    fn read_kiln(&mut self) -> Result<f32, SensorFault>;

    /// Board / cold-junction reference temperature (°C), if the converter
    /// provides one. Independent of the thermocouple leg.
    fn read_board(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Heater port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the SSR and its companion status LED.
pub trait HeaterPort {
    /// Energise or de-energise the heating element. Called every tick.
    fn set_heater(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`KilnEvent`](super::events::KilnEvent)s
/// through this port. Adapters decide where they go (serial log, dashboard
/// push, message bus).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::KilnEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// # Validation
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped, so a bad dashboard form cannot lift `maxTempC` out
/// of range or zero the SSR window.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`KilnConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<KilnConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &KilnConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
