//! Default GPIO assignments for the reference controller board
//! (ESP8266 D1-mini footprint).
//!
//! These only seed [`PinConfig::default`](crate::config::PinConfig); the
//! live assignment comes from configuration and may mark any role as not
//! fitted.

// ---------------------------------------------------------------------------
// Heater output
// ---------------------------------------------------------------------------

/// Digital output driving the solid-state relay (active HIGH). D0.
pub const SSR_GPIO: i32 = 16;

/// On-board status LED, lit while the heater is on. Active LOW.
pub const LED_GPIO: i32 = 2;

/// Piezo buzzer for end-of-step signals. D2.
pub const BUZZER_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Thermocouple converter (software SPI)
// ---------------------------------------------------------------------------

pub const SPI_SCK_GPIO: i32 = 2;
pub const SPI_CS_GPIO: i32 = 15;
pub const SPI_MISO_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// I²C bus (OLED display)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 12;
