//! Safety / run supervisor.
//!
//! Holds the two independent switches that gate every watt going into the
//! kiln:
//!
//! - **run active**: operator intent to heat (`Start` / `Stop`).
//! - **safety trip**: hard inhibit, any bit of a latched fault bitmask.
//!
//! ## Fault lifecycle
//!
//! 1. A condition latches a fault bit (over-temperature seen in
//!    [`evaluate`](SafetySupervisor::evaluate), an external trip, an output
//!    write failure).
//! 2. While any bit is set the window driver forces the SSR off, the
//!    profile clock freezes, and `Start` is refused.
//! 3. Faults stay latched when the condition goes away. Only
//!    [`clear`](SafetySupervisor::clear) removes them; a condition that is
//!    still present re-latches on the next evaluation.

use crate::config::KilnConfig;
use crate::error::SafetyFault;
use crate::sensors::SensorReading;
use log::{error, info, warn};

/// Safety supervisor.
pub struct SafetySupervisor {
    max_temp_c: f32,
    overtemp_interlock: bool,
    /// Latched fault bitmask.
    faults: u8,
    run_active: bool,
}

impl SafetySupervisor {
    pub fn new(config: &KilnConfig) -> Self {
        Self {
            max_temp_c: config.max_temp_c,
            overtemp_interlock: config.overtemp_interlock,
            faults: 0,
            run_active: false,
        }
    }

    /// Re-read limits after a configuration change. Latched faults stay.
    pub fn apply_config(&mut self, config: &KilnConfig) {
        self.max_temp_c = config.max_temp_c;
        self.overtemp_interlock = config.overtemp_interlock;
    }

    // ── Run intent ────────────────────────────────────────────────

    /// Operator asks to heat. Refused with the first latched fault while
    /// tripped.
    pub fn request_start(&mut self) -> Result<(), SafetyFault> {
        if let Some(fault) = self.first_fault() {
            warn!("start refused: {fault}");
            return Err(fault);
        }
        self.run_active = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.run_active = false;
    }

    pub fn run_active(&self) -> bool {
        self.run_active
    }

    /// Heating is allowed only while running and not tripped.
    pub fn heating_permitted(&self) -> bool {
        self.run_active && !self.is_tripped()
    }

    // ── Faults ────────────────────────────────────────────────────

    /// Evaluate the interlocks against the latest reading. Returns the
    /// updated fault bitmask.
    ///
    /// An invalid reading never trips: missing feedback already zeroes the
    /// duty, and the last good reading is not trusted either way.
    pub fn evaluate(&mut self, reading: &SensorReading) -> u8 {
        if let Some(kiln_c) = reading.kiln_c {
            if self.overtemp_interlock && kiln_c > self.max_temp_c {
                self.latch(SafetyFault::OverTemperature);
            }
        }
        self.faults
    }

    /// Latch a fault from outside the evaluation path.
    pub fn trip(&mut self, fault: SafetyFault) {
        self.latch(fault);
    }

    /// Clear every latched fault. Returns the mask that was cleared.
    pub fn clear(&mut self) -> u8 {
        let cleared = self.faults;
        if cleared != 0 {
            info!("SAFETY FAULTS CLEARED: 0b{:08b}", cleared);
        }
        self.faults = 0;
        cleared
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is latched.
    pub fn is_tripped(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    fn latch(&mut self, fault: SafetyFault) {
        if self.faults & fault.mask() == 0 {
            error!("SAFETY FAULT SET: {fault}");
        }
        self.faults |= fault.mask();
    }

    fn first_fault(&self) -> Option<SafetyFault> {
        SafetyFault::ALL.into_iter().find(|f| self.has_fault(*f))
    }
}
