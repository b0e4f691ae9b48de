//! Rolling sample history for the dashboard trend and CSV export.
//!
//! A fixed-capacity FIFO: once full, every new sample evicts the oldest,
//! so memory stays bounded for the device's whole uptime and the buffer
//! always holds the newest `N` samples in chronological order. Backed by a
//! `heapless::Deque`, so eviction is O(1). Never persisted.

use core::fmt::{self, Write};

use heapless::Deque;
use serde::Serialize;

/// Default capacity: four minutes at one sample per second.
pub const HISTORY_CAPACITY: usize = 240;

/// CSV header understood by the dashboard export.
pub const CSV_HEADER: &str = "rev,tempC,out,heat";

/// One point of the trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Run generation at the time of sampling.
    pub generation: u32,
    /// Kiln temperature; `None` when the sensor was faulted.
    pub temp_c: Option<f32>,
    /// Duty cycle in percent.
    pub duty: f32,
    pub heater_on: bool,
}

/// Bounded FIFO of samples, newest at the tail.
#[derive(Debug, Clone, Default)]
pub struct SampleHistory<const N: usize = HISTORY_CAPACITY> {
    samples: Deque<Sample, N>,
}

impl<const N: usize> SampleHistory<N> {
    pub fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Append `sample`, evicting the oldest entry when full.
    pub fn record(&mut self, sample: Sample) {
        if self.samples.is_full() {
            let _ = self.samples.pop_front();
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = self.samples.push_back(sample);
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    /// Full ordered dump.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Write the CSV export: header, then one row per sample. Temperature
    /// has two decimals (`NaN` when invalid), duty one, heater `0`/`1`.
    pub fn write_csv<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "{CSV_HEADER}")?;
        for s in self.samples.iter() {
            write!(out, "{},", s.generation)?;
            match s.temp_c {
                Some(t) if t.is_finite() => write!(out, "{t:.2}")?,
                _ => out.write_str("NaN")?,
            }
            writeln!(out, ",{:.1},{}", s.duty, u8::from(s.heater_on))?;
        }
        Ok(())
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.samples.len() + 4));
        // Writing into a String cannot fail.
        let _ = self.write_csv(&mut out);
        out
    }
}
