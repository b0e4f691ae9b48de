//! Sensor subsystem: throttled thermocouple acquisition.
//!
//! The [`SensorReader`] polls a [`TemperatureSource`] at most once per
//! `sensor_interval_ms` (4 Hz by default) and caches the result, so the
//! control tick can run as fast as the superloop spins without hammering
//! the converter. Between physical reads the tick sees the cached value.
//!
//! A hardware fault on the thermocouple leg marks the kiln temperature
//! invalid but leaves the board (cold-junction) temperature untouched: the
//! two are reported independently.

pub mod filter;

use log::{debug, warn};

use crate::app::ports::TemperatureSource;
use crate::error::SensorFault;
use crate::scheduler::Interval;
use filter::Ema;

/// Result of the most recent physical read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorReading {
    /// Kiln temperature (°C, filtered); `None` while the thermocouple is faulted.
    pub kiln_c: Option<f32>,
    /// Converter board / cold-junction temperature (°C).
    pub board_c: Option<f32>,
    /// Why `kiln_c` is absent, if it is.
    pub fault: Option<SensorFault>,
}

impl SensorReading {
    pub fn is_valid(&self) -> bool {
        self.kiln_c.is_some()
    }
}

/// Rate-limited reader over a temperature source.
pub struct SensorReader {
    interval: Interval,
    filter: Ema,
    latest: SensorReading,
}

impl SensorReader {
    pub fn new(interval_ms: u32, filter_alpha: f32) -> Self {
        Self {
            interval: Interval::new(u64::from(interval_ms)),
            filter: Ema::new(filter_alpha),
            latest: SensorReading {
                kiln_c: None,
                board_c: None,
                fault: Some(SensorFault::Unbound),
            },
        }
    }

    /// Read the hardware if the throttle allows, then return the cached
    /// reading. Returns `true` in the tuple when a physical read happened.
    pub fn sample(&mut self, now_ms: u64, source: &mut impl TemperatureSource) -> (SensorReading, bool) {
        if !self.interval.poll(now_ms) {
            return (self.latest, false);
        }

        let kiln = match source.read_kiln() {
            Ok(c) if c.is_finite() => Ok(c),
            Ok(_) => Err(SensorFault::NotFinite),
            Err(fault) => Err(fault),
        };
        let board_c = source.read_board().filter(|c| c.is_finite());

        self.latest = match kiln {
            Ok(raw) => {
                let filtered = self.filter.update(raw);
                debug!("sensor: raw={:.2} filtered={:.2} board={:?}", raw, filtered, board_c);
                SensorReading {
                    kiln_c: Some(filtered),
                    board_c,
                    fault: None,
                }
            }
            Err(fault) => {
                if self.latest.fault != Some(fault) {
                    warn!("sensor: {}", fault);
                }
                self.filter.reset();
                SensorReading {
                    kiln_c: None,
                    board_c,
                    fault: Some(fault),
                }
            }
        };
        (self.latest, true)
    }

    /// Most recent reading without touching the hardware.
    pub fn latest(&self) -> SensorReading {
        self.latest
    }

    pub fn set_interval_ms(&mut self, interval_ms: u32) {
        self.interval.set_period(u64::from(interval_ms));
    }

    pub fn set_filter_alpha(&mut self, alpha: f32) {
        self.filter.set_alpha(alpha);
    }
}
