//! Controller configuration parameters
//!
//! All tunable parameters for the kiln controller. The core only reads a
//! [`KilnConfig`] value; where and how it is stored is the business of a
//! [`ConfigPort`](crate::app::ports::ConfigPort) adapter.
//!
//! The JSON form keeps the key names of the deployed firmware's
//! `config.json` (`pins.SSR`, `pid.Kp`, `maxTempC`, `mode` = 0/1, ...), so
//! files written by older units load unchanged. Missing keys fall back to
//! the defaults below; a negative pin number means "not fitted".

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::app::ports::ConfigError;
use crate::control::pid::PidParameters;
use crate::pins;

/// Upper bound of any temperature the controller accepts (°C).
pub const MAX_TARGET_C: f32 = 2000.0;

/// Thermocouple reads are never spaced closer than this (4 Hz).
pub const MIN_SENSOR_INTERVAL_MS: u32 = 250;

/// History is never sampled faster than 1 Hz.
pub const MIN_HISTORY_INTERVAL_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// How the regulator setpoint is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// The operator sets the setpoint directly.
    #[default]
    Direct,
    /// The setpoint follows the active step of the loaded firing profile.
    Profile,
}

impl Serialize for ControlMode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(match self {
            Self::Direct => 0,
            Self::Profile => 1,
        })
    }
}

impl<'de> Deserialize<'de> for ControlMode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match u8::deserialize(d)? {
            1 => Self::Profile,
            _ => Self::Direct,
        })
    }
}

// ---------------------------------------------------------------------------
// Pin roles
// ---------------------------------------------------------------------------

/// GPIO role assignment. `None` marks a role as not fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    #[serde(rename = "SSR", with = "pin_number")]
    pub ssr: Option<i32>,
    #[serde(rename = "LED", with = "pin_number")]
    pub led: Option<i32>,
    #[serde(rename = "BUZZ", with = "pin_number")]
    pub buzzer: Option<i32>,
    #[serde(rename = "SPI_SCK", with = "pin_number")]
    pub spi_sck: Option<i32>,
    #[serde(rename = "SPI_CS", with = "pin_number")]
    pub spi_cs: Option<i32>,
    #[serde(rename = "SPI_MISO", with = "pin_number")]
    pub spi_miso: Option<i32>,
    #[serde(rename = "I2C_SDA", with = "pin_number")]
    pub i2c_sda: Option<i32>,
    #[serde(rename = "I2C_SCL", with = "pin_number")]
    pub i2c_scl: Option<i32>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            ssr: Some(pins::SSR_GPIO),
            led: Some(pins::LED_GPIO),
            buzzer: Some(pins::BUZZER_GPIO),
            spi_sck: Some(pins::SPI_SCK_GPIO),
            spi_cs: Some(pins::SPI_CS_GPIO),
            spi_miso: Some(pins::SPI_MISO_GPIO),
            i2c_sda: Some(pins::I2C_SDA_GPIO),
            i2c_scl: Some(pins::I2C_SCL_GPIO),
        }
    }
}

impl PinConfig {
    pub fn ssr_available(&self) -> bool {
        self.ssr.is_some()
    }

    pub fn led_available(&self) -> bool {
        self.led.is_some()
    }
}

/// Pin numbers travel as plain integers, `-1` meaning "not fitted".
mod pin_number {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pin: &Option<i32>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i32(pin.unwrap_or(-1))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        let raw = i32::deserialize(d)?;
        Ok((raw >= 0).then_some(raw))
    }
}

// ---------------------------------------------------------------------------
// Regulator tuning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    #[serde(rename = "Kp")]
    pub kp: f32,
    #[serde(rename = "Ki")]
    pub ki: f32,
    #[serde(rename = "Kd")]
    pub kd: f32,
    /// Setpoint used in direct mode after boot (°C).
    #[serde(rename = "setpointC")]
    pub setpoint_c: f32,
    #[serde(rename = "outMin")]
    pub out_min: f32,
    #[serde(rename = "outMax")]
    pub out_max: f32,
    /// SSR time-proportioning window (milliseconds).
    #[serde(rename = "windowMs")]
    pub window_ms: u32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 20.0,
            ki: 0.8,
            kd: 50.0,
            setpoint_c: 200.0,
            out_min: 0.0,
            out_max: 100.0,
            window_ms: 2000,
        }
    }
}

impl PidConfig {
    /// This block with gains, bounds and window taken from `params`. The
    /// direct-mode setpoint is kept.
    pub fn with_parameters(&self, params: &PidParameters) -> Self {
        Self {
            kp: params.kp,
            ki: params.ki,
            kd: params.kd,
            out_min: params.out_min,
            out_max: params.out_max,
            window_ms: params.window_ms,
            ..*self
        }
    }

    /// Range-check the regulator block. Shared by whole-config validation
    /// and live tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for gain in [self.kp, self.ki, self.kd] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::ValidationFailed(
                    "pid gains must be finite and >= 0",
                ));
            }
        }
        if !(0.0..=100.0).contains(&self.out_min) || !(0.0..=100.0).contains(&self.out_max) {
            return Err(ConfigError::ValidationFailed("pid output bounds must be 0–100"));
        }
        if self.out_min >= self.out_max {
            return Err(ConfigError::ValidationFailed("pid outMin must be < outMax"));
        }
        if !(100..=60_000).contains(&self.window_ms) {
            return Err(ConfigError::ValidationFailed("pid windowMs must be 100–60000"));
        }
        if !(0.0..=MAX_TARGET_C).contains(&self.setpoint_c) {
            return Err(ConfigError::ValidationFailed("pid setpointC must be 0–2000"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Top-level configuration
// ---------------------------------------------------------------------------

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    pub pins: PinConfig,
    pub pid: PidConfig,
    pub mode: ControlMode,

    // --- Presentation ---
    /// Trend span shown by the dashboard (seconds). Not used by the loop.
    #[serde(rename = "sampleSec")]
    pub sample_secs: u32,

    // --- Safety ---
    /// Maximum allowed kiln temperature (°C).
    #[serde(rename = "maxTempC")]
    pub max_temp_c: f32,
    /// Latch a safety trip when the kiln exceeds `max_temp_c`.
    #[serde(rename = "overtempInterlock")]
    pub overtemp_interlock: bool,

    // --- Timing ---
    /// Minimum spacing of physical thermocouple reads (milliseconds).
    #[serde(rename = "sensorIntervalMs")]
    pub sensor_interval_ms: u32,
    /// Spacing of history samples (milliseconds).
    #[serde(rename = "historyIntervalMs")]
    pub history_interval_ms: u32,

    // --- Filtering ---
    /// EMA weight of each new reading; 1.0 disables smoothing.
    #[serde(rename = "filterAlpha")]
    pub filter_alpha: f32,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            pins: PinConfig::default(),
            pid: PidConfig::default(),
            mode: ControlMode::Direct,

            sample_secs: 600,

            max_temp_c: 950.0,
            overtemp_interlock: true,

            sensor_interval_ms: 250, // 4 Hz
            history_interval_ms: 1000, // 1 Hz

            filter_alpha: 1.0,
        }
    }
}

impl KilnConfig {
    /// Parse the `config.json` document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)
    }

    /// Render the `config.json` document.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|_| ConfigError::IoError)
    }

    /// Regulator parameters derived from the `pid` block.
    pub fn pid_parameters(&self) -> PidParameters {
        PidParameters {
            kp: self.pid.kp,
            ki: self.pid.ki,
            kd: self.pid.kd,
            out_min: self.pid.out_min,
            out_max: self.pid.out_max,
            window_ms: self.pid.window_ms,
        }
    }

    /// Range-check every field. Adapters call this before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pid.validate()?;
        if !(0.0..=MAX_TARGET_C).contains(&self.max_temp_c) {
            return Err(ConfigError::ValidationFailed("maxTempC must be 0–2000"));
        }
        if self.sensor_interval_ms < MIN_SENSOR_INTERVAL_MS {
            return Err(ConfigError::ValidationFailed("sensorIntervalMs must be >= 250"));
        }
        if self.history_interval_ms < MIN_HISTORY_INTERVAL_MS {
            return Err(ConfigError::ValidationFailed("historyIntervalMs must be >= 1000"));
        }
        if !(self.filter_alpha > 0.0 && self.filter_alpha <= 1.0) {
            return Err(ConfigError::ValidationFailed("filterAlpha must be in (0, 1]"));
        }
        Ok(())
    }
}
