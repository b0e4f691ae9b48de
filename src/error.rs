//! Unified error types for the kiln controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command boundary of the control loop uniform.  All variants are `Copy`
//! so they can be passed through the safety supervisor and the event sink
//! without allocation.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple could not be read.
    Sensor(SensorFault),
    /// An output pin could not be driven.
    Actuator(ActuatorError),
    /// A safety interlock refused the request.
    Safety(SafetyFault),
    /// A firing profile was rejected.
    Profile(ProfileError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A command argument was outside its accepted domain.
    InvalidInput(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Profile(e) => write!(f, "profile: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Reasons a thermocouple read produced no temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Thermocouple leg is open (broken wire, unplugged probe).
    OpenCircuit,
    /// Thermocouple shorted to ground.
    ShortToGround,
    /// Thermocouple shorted to supply.
    ShortToVcc,
    /// The converter returned NaN or infinity.
    NotFinite,
    /// No sensor transport is bound (e.g. during a pin reassignment).
    Unbound,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "thermocouple open circuit"),
            Self::ShortToGround => write!(f, "thermocouple short to GND"),
            Self::ShortToVcc => write!(f, "thermocouple short to VCC"),
            Self::NotFinite => write!(f, "reading not finite"),
            Self::Unbound => write!(f, "no sensor bound"),
        }
    }
}

impl std::error::Error for SensorFault {}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO write to the SSR or status LED failed.
    PinWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinWriteFailed => write!(f, "pin write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Conditions that assert the safety trip.  They are latched in a bitfield
/// by the supervisor so that several can be active at once; any set bit
/// inhibits all heating until the trip is explicitly cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Kiln temperature exceeded the configured maximum.
    OverTemperature = 0b0000_0001,
    /// Trip asserted from outside the control loop (operator, watchdog).
    External = 0b0000_0010,
    /// The heater output could not be driven; its real state is unknown.
    OutputFault = 0b0000_0100,
}

impl SafetyFault {
    pub const ALL: [SafetyFault; 3] = [
        SafetyFault::OverTemperature,
        SafetyFault::External,
        SafetyFault::OutputFault,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverTemperature => write!(f, "over temperature"),
            Self::External => write!(f, "external trip"),
            Self::OutputFault => write!(f, "heater output fault"),
        }
    }
}

impl std::error::Error for SafetyFault {}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Profile errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// More steps than a profile can hold.
    TooManySteps,
    /// A step target lies outside 0–2000 °C.
    TargetOutOfRange,
    /// The profile document could not be parsed.
    MalformedJson,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManySteps => write!(f, "too many steps"),
            Self::TargetOutOfRange => write!(f, "target temperature out of range"),
            Self::MalformedJson => write!(f, "malformed profile JSON"),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<ProfileError> for Error {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
