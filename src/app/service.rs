//! Control loop, the hexagonal core.
//!
//! [`ControlLoop`] owns every piece of controller state: the sensor
//! reader, PID regulator, SSR window, profile runner, safety supervisor and
//! sample history. It exposes a clean, hardware-agnostic API. All I/O
//! flows through port traits injected at call sites, making the entire
//! loop testable with mock adapters.
//!
//! ```text
//!  TemperatureSource ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                        │       ControlLoop        │
//!       HeaterPort ◀──── │ Profile · Safety · PID   │
//!                        └──────────────────────────┘
//! ```
//!
//! The host calls [`tick`](ControlLoop::tick) from its superloop with a
//! monotonic millisecond timestamp. Commands are synchronous methods that
//! must not run concurrently with a tick.

use log::{error, info, warn};

use crate::config::{ControlMode, KilnConfig, MAX_TARGET_C};
use crate::control::pid::{PidParameters, PidRegulator};
use crate::control::window::{WindowDriver, sanitize_duty};
use crate::error::{Error, Result, SafetyFault, SensorFault};
use crate::history::{Sample, SampleHistory};
use crate::profile::{Profile, ProfileProgress, ProfileRunner, ProfileState, ProfileUpdate};
use crate::safety::SafetySupervisor;
use crate::scheduler::Interval;
use crate::sensors::{SensorReader, SensorReading};

use super::commands::KilnCommand;
use super::events::{KilnEvent, StatusSnapshot};
use super::ports::{ConfigPort, EventSink, HeaterPort, TemperatureSource};

/// Delay between the last config change and its automatic persistence.
const CONFIG_SAVE_DELAY_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

/// The single owner of all controller state.
pub struct ControlLoop {
    config: KilnConfig,
    sensor: SensorReader,
    reading: SensorReading,
    pid: PidRegulator,
    window: WindowDriver,
    profile: ProfileRunner,
    safety: SafetySupervisor,
    history: SampleHistory,
    history_interval: Interval,
    duty: f32,
    heater_on: bool,
    /// Incremented once per accepted `Start`.
    generation: u32,
    tick_count: u64,
    last_tick_ms: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
    /// Fault last announced with `SensorLost`, cleared on recovery.
    sensor_fault_reported: Option<SensorFault>,
}

impl ControlLoop {
    /// Construct the loop from configuration, heater off and not running.
    pub fn new(config: KilnConfig, now_ms: u64) -> Self {
        let params = config.pid_parameters();
        let sensor = SensorReader::new(config.sensor_interval_ms, config.filter_alpha);
        Self {
            reading: sensor.latest(),
            sensor,
            pid: PidRegulator::new(&params, config.pid.setpoint_c),
            window: WindowDriver::new(params.window_ms, now_ms),
            profile: ProfileRunner::new(),
            safety: SafetySupervisor::new(&config),
            history: SampleHistory::new(),
            history_interval: Interval::new(u64::from(config.history_interval_ms)),
            duty: 0.0,
            heater_on: false,
            generation: 0,
            tick_count: 0,
            last_tick_ms: now_ms,
            config_dirty: false,
            dirty_since_ms: now_ms,
            sensor_fault_reported: None,
            config,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: sensor → safety/profile → PID → SSR → history.
    ///
    /// The `hw` parameter satisfies **both** [`TemperatureSource`] and
    /// [`HeaterPort`]. This avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl TemperatureSource + HeaterPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        self.last_tick_ms = now_ms;

        // 1. Sensor (throttled)
        let (reading, fresh) = self.sensor.sample(now_ms, hw);
        if fresh {
            match reading.fault {
                Some(fault) if self.sensor_fault_reported != Some(fault) => {
                    self.sensor_fault_reported = Some(fault);
                    sink.emit(&KilnEvent::SensorLost(fault));
                }
                None if reading.is_valid() && !self.reading.is_valid() => {
                    self.sensor_fault_reported = None;
                    sink.emit(&KilnEvent::SensorRestored);
                }
                _ => {}
            }
        }
        self.reading = reading;

        // 2. Safety, then run / profile state
        let prev_faults = self.safety.faults();
        let faults = self.safety.evaluate(&reading);
        if faults != prev_faults {
            sink.emit(&KilnEvent::SafetyTripped(faults));
        }

        let advancing = self.config.mode == ControlMode::Profile
            && self.safety.heating_permitted()
            && reading.is_valid();
        match self.profile.update(now_ms, advancing) {
            ProfileUpdate::Entered { index, target_c } => {
                self.pid.set_target(target_c);
                sink.emit(&KilnEvent::StepEntered {
                    index,
                    count: self.profile.profile().len(),
                    target_c,
                });
            }
            ProfileUpdate::Running => {
                // A direct setpoint written in profile mode does not stick.
                if let Some(target_c) = self.profile.target_c() {
                    self.pid.set_target(target_c);
                }
            }
            ProfileUpdate::Finished => {
                self.safety.stop();
                self.window.force_off();
                sink.emit(&KilnEvent::ProfileFinished);
            }
            ProfileUpdate::Held => {}
        }

        // 3. PID (fail-safe on missing feedback)
        self.duty = match reading.kiln_c {
            Some(kiln_c) if self.safety.heating_permitted() => {
                sanitize_duty(self.pid.compute(kiln_c, now_ms))
            }
            _ => {
                self.pid.hold();
                0.0
            }
        };

        // 4. SSR window
        let on = self.window.drive(
            now_ms,
            self.duty,
            self.safety.run_active(),
            self.safety.is_tripped(),
        );
        self.write_heater(on, hw, sink);

        // 5. History (1 Hz)
        if self.history_interval.poll(now_ms) {
            self.history.record(Sample {
                generation: self.generation,
                temp_c: reading.kiln_c,
                duty: self.duty,
                heater_on: self.heater_on,
            });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command. Refusals are returned, never panicked.
    pub fn handle_command(
        &mut self,
        cmd: KilnCommand,
        now_ms: u64,
        hw: &mut impl HeaterPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            KilnCommand::Start => self.start(now_ms, sink),
            KilnCommand::Stop => {
                self.stop(hw, sink);
                Ok(())
            }
            KilnCommand::SetSetpoint(c) => self.set_setpoint(c),
            KilnCommand::ApplyProfile(profile) => {
                self.apply_profile(profile, now_ms, sink);
                Ok(())
            }
            KilnCommand::ApplyTuning(params) => self.apply_tuning(params, sink),
            KilnCommand::NextStep => {
                self.next_step(now_ms, sink);
                Ok(())
            }
            KilnCommand::PrevStep => {
                self.prev_step(now_ms, sink);
                Ok(())
            }
            KilnCommand::GotoStep(index) => {
                self.goto_step(index, now_ms, sink);
                Ok(())
            }
            KilnCommand::SetMode(mode) => {
                self.set_mode(mode, now_ms, sink);
                Ok(())
            }
            KilnCommand::Trip(fault) => {
                self.trip(fault, hw, sink);
                Ok(())
            }
            KilnCommand::ClearTrip => {
                self.clear_trip(sink);
                Ok(())
            }
            KilnCommand::UpdateConfig(config) => self.update_config(config, now_ms, sink),
        }
    }

    /// Begin heating. Refused while tripped.
    ///
    /// Bumps the run generation, starts the regulator from a clean state
    /// and, in profile mode, restarts the current step's hold from zero.
    pub fn start(&mut self, now_ms: u64, sink: &mut impl EventSink) -> Result<()> {
        if let Err(fault) = self.safety.request_start() {
            sink.emit(&KilnEvent::StartRefused(fault));
            return Err(Error::Safety(fault));
        }
        self.generation = self.generation.saturating_add(1);
        self.pid.reset();
        if self.config.mode == ControlMode::Profile {
            if let Some(target_c) = self.profile.restart_step(now_ms) {
                self.pid.set_target(target_c);
            }
        }
        info!("Run started (gen={})", self.generation);
        sink.emit(&KilnEvent::RunStarted {
            generation: self.generation,
        });
        Ok(())
    }

    /// Stop heating. The heater is switched off now, not on the next tick.
    pub fn stop(&mut self, hw: &mut impl HeaterPort, sink: &mut impl EventSink) {
        self.safety.stop();
        self.duty = 0.0;
        self.window.force_off();
        self.write_heater(false, hw, sink);
        info!("Run stopped");
        sink.emit(&KilnEvent::RunStopped);
    }

    /// Direct setpoint. In profile mode the active step overrides it on the
    /// next running tick.
    pub fn set_setpoint(&mut self, target_c: f32) -> Result<()> {
        if !target_c.is_finite() || !(0.0..=MAX_TARGET_C).contains(&target_c) {
            return Err(Error::InvalidInput("setpoint must be 0–2000 °C"));
        }
        self.pid.set_target(target_c);
        info!("Setpoint -> {:.1} C", target_c);
        Ok(())
    }

    /// Replace the schedule. Non-empty selects profile mode and enters step
    /// 0; empty clears it and returns to direct mode.
    pub fn apply_profile(&mut self, profile: Profile, now_ms: u64, sink: &mut impl EventSink) {
        let steps = profile.len();
        match self.profile.load(profile, now_ms) {
            Some(target_c) => {
                self.switch_mode(ControlMode::Profile, sink);
                self.pid.set_target(target_c);
                sink.emit(&KilnEvent::ProfileLoaded { steps });
                sink.emit(&KilnEvent::StepEntered {
                    index: 0,
                    count: steps,
                    target_c,
                });
            }
            None => {
                self.switch_mode(ControlMode::Direct, sink);
                sink.emit(&KilnEvent::ProfileCleared);
            }
        }
    }

    /// New gains, bounds and window, taken without a restart.
    pub fn apply_tuning(&mut self, params: PidParameters, sink: &mut impl EventSink) -> Result<()> {
        if !params.is_valid() {
            return Err(Error::InvalidInput(
                "tuning needs finite gains, outMin < outMax and windowMs > 0",
            ));
        }
        // Whatever is taken live must also survive a save and reload.
        let pid = self.config.pid.with_parameters(&params);
        pid.validate()?;

        self.pid.set_tunings(&params);
        self.window.set_window_ms(params.window_ms);
        self.config.pid = pid;
        self.mark_config_dirty();

        info!(
            "Tuning applied: Kp={} Ki={} Kd={} out=[{}, {}] window={}ms",
            params.kp, params.ki, params.kd, params.out_min, params.out_max, params.window_ms
        );
        sink.emit(&KilnEvent::TuningApplied);
        Ok(())
    }

    pub fn next_step(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        let entered = self.profile.next_step(now_ms);
        self.on_manual_entry(entered, sink);
    }

    pub fn prev_step(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        let entered = self.profile.prev_step(now_ms);
        self.on_manual_entry(entered, sink);
    }

    /// Jump to step `index`; out-of-range is ignored.
    pub fn goto_step(&mut self, index: usize, now_ms: u64, sink: &mut impl EventSink) {
        let entered = self.profile.goto_step(index, now_ms);
        self.on_manual_entry(entered, sink);
    }

    /// Select direct or profile control. Entering profile mode retargets the
    /// regulator at the active step.
    pub fn set_mode(&mut self, mode: ControlMode, now_ms: u64, sink: &mut impl EventSink) {
        if mode == self.config.mode {
            return;
        }
        self.switch_mode(mode, sink);
        if mode == ControlMode::Profile
            && matches!(self.profile.state(), ProfileState::StepActive(_))
        {
            // Time spent in direct mode does not count toward the hold.
            if let Some(target_c) = self.profile.restart_step(now_ms) {
                self.pid.set_target(target_c);
            }
        }
    }

    /// Latch `fault` and switch the heater off now.
    pub fn trip(&mut self, fault: SafetyFault, hw: &mut impl HeaterPort, sink: &mut impl EventSink) {
        let prev = self.safety.faults();
        self.safety.trip(fault);
        self.window.force_off();
        self.write_heater(false, hw, sink);
        if self.safety.faults() != prev {
            sink.emit(&KilnEvent::SafetyTripped(self.safety.faults()));
        }
    }

    /// Clear every latched fault. Run intent is left as it was.
    pub fn clear_trip(&mut self, sink: &mut impl EventSink) {
        let cleared = self.safety.clear();
        if cleared != 0 {
            sink.emit(&KilnEvent::TripCleared(cleared));
        }
    }

    /// Hot-reload configuration. Rejected as a whole if any field is out
    /// of range. A mode change goes through [`Self::set_mode`], so the
    /// active step is retargeted exactly as for `SetMode`.
    pub fn update_config(
        &mut self,
        config: KilnConfig,
        now_ms: u64,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        config.validate()?;
        let params = config.pid_parameters();
        self.pid.set_tunings(&params);
        self.window.set_window_ms(params.window_ms);
        self.safety.apply_config(&config);
        self.sensor.set_interval_ms(config.sensor_interval_ms);
        self.sensor.set_filter_alpha(config.filter_alpha);
        self.history_interval.set_period(u64::from(config.history_interval_ms));

        let mode = config.mode;
        self.config = KilnConfig {
            mode: self.config.mode,
            ..config
        };
        self.set_mode(mode, now_ms, sink);
        if mode == ControlMode::Direct {
            self.pid.set_target(self.config.pid.setpoint_c);
        }
        self.mark_config_dirty();
        info!("Configuration updated at runtime");
        sink.emit(&KilnEvent::ConfigUpdated);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of everything the presentation layer shows.
    pub fn status(&self) -> StatusSnapshot {
        let mut progress = self.profile.progress();
        if self.config.mode != ControlMode::Profile {
            progress = ProfileProgress {
                state: ProfileState::Idle,
                elapsed_secs: 0,
                remaining_secs: 0,
                ..progress
            };
        }
        StatusSnapshot {
            kiln_c: self.reading.kiln_c,
            board_c: self.reading.board_c,
            setpoint_c: self.pid.target(),
            duty: self.duty,
            run_active: self.safety.run_active(),
            safety_trip: self.safety.is_tripped(),
            fault_flags: self.safety.faults(),
            heater_on: self.heater_on,
            sensor_ok: self.reading.is_valid(),
            generation: self.generation,
            mode: self.config.mode,
            progress,
        }
    }

    /// Full ordered sample dump.
    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// History rendered as `rev,tempC,out,heat` CSV.
    pub fn samples_csv(&self) -> String {
        self.history.to_csv()
    }

    pub fn profile(&self) -> &Profile {
        self.profile.profile()
    }

    pub fn mode(&self) -> ControlMode {
        self.config.mode
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Clone of the live configuration (for read-back or delta updates).
    pub fn current_config(&self) -> KilnConfig {
        self.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    /// Drive the heater output. A failed write latches
    /// [`SafetyFault::OutputFault`] and retries the pin low.
    fn write_heater(&mut self, on: bool, hw: &mut impl HeaterPort, sink: &mut impl EventSink) {
        match hw.set_heater(on) {
            Ok(()) => self.heater_on = on,
            Err(e) => {
                error!("Heater write failed ({}), forcing off", e);
                let prev = self.safety.faults();
                self.safety.trip(SafetyFault::OutputFault);
                self.window.force_off();
                self.heater_on = false;
                if hw.set_heater(false).is_err() {
                    error!("Heater still not writable");
                }
                if self.safety.faults() != prev {
                    sink.emit(&KilnEvent::SafetyTripped(self.safety.faults()));
                }
            }
        }
    }

    fn on_manual_entry(&mut self, entered: Option<f32>, sink: &mut impl EventSink) {
        let Some(target_c) = entered else {
            return;
        };
        if self.config.mode == ControlMode::Profile {
            self.pid.set_target(target_c);
        }
        sink.emit(&KilnEvent::StepEntered {
            index: self.profile.progress().active_step,
            count: self.profile.profile().len(),
            target_c,
        });
    }

    fn switch_mode(&mut self, mode: ControlMode, sink: &mut impl EventSink) {
        if self.config.mode == mode {
            return;
        }
        info!("Mode -> {:?}", mode);
        self.config.mode = mode;
        self.mark_config_dirty();
        sink.emit(&KilnEvent::ModeChanged(mode));
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = self.last_tick_ms;
        }
    }

    /// Persist the config once it has been stable for a few seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty
            || now_ms.saturating_sub(self.dirty_since_ms) < CONFIG_SAVE_DELAY_MS
        {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Force-save if dirty (call before shutdown).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if !self.config_dirty {
            return;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config force-saved before shutdown");
            }
            Err(e) => warn!("Config force-save failed: {}", e),
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
