//! Integration tests for the ControlLoop → window → heater pipeline.
//!
//! These run on the host and drive the full tick (sensor, safety, PID,
//! SSR window, history) through mock adapters.

use crate::mock_hw::{MockKiln, MockStore, RecordingSink, make_loop, run};

use kilnctl::app::commands::KilnCommand;
use kilnctl::app::events::KilnEvent;
use kilnctl::app::ports::ConfigError;
use kilnctl::config::KilnConfig;
use kilnctl::error::{Error, SafetyFault, SensorFault};
use kilnctl::ControlLoop;

// ── Actuation ─────────────────────────────────────────────────

#[test]
fn idle_loop_never_energises_the_heater() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    run(&mut ctl, &mut hw, &mut sink, 0, 10_000, 50);
    assert!(hw.writes.iter().all(|on| !on));
    let s = ctl.status();
    assert!(!s.run_active);
    assert!(s.sensor_ok);
    assert_eq!(s.duty, 0.0);
}

#[test]
fn cold_kiln_heats_at_full_power_once_started() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.handle_command(KilnCommand::Start, 0, &mut hw, &mut sink)
        .unwrap();
    run(&mut ctl, &mut hw, &mut sink, 0, 4_000, 100);
    assert!(hw.heater());
    let s = ctl.status();
    assert_eq!(s.duty, 100.0);
    assert!(s.heater_on);
    assert_eq!(s.kiln_c, Some(25.0));
    assert_eq!(s.board_c, Some(27.5));
}

#[test]
fn invalid_sensor_zeroes_duty_on_the_same_tick() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    assert!(hw.heater());

    hw.temp = Err(SensorFault::OpenCircuit);
    ctl.tick(250, &mut hw, &mut sink);
    let s = ctl.status();
    assert!(!s.sensor_ok);
    assert_eq!(s.duty, 0.0);
    assert!(!s.heater_on);
    assert!(!hw.heater());
    // Board reference is reported independently.
    assert_eq!(s.board_c, Some(27.5));
    // Run intent survives a sensor fault.
    assert!(s.run_active);
}

#[test]
fn sensor_loss_and_recovery_are_reported() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.tick(0, &mut hw, &mut sink);
    hw.temp = Err(SensorFault::ShortToGround);
    run(&mut ctl, &mut hw, &mut sink, 250, 1_000, 250);
    hw.temp = Ok(30.0);
    ctl.tick(1_250, &mut hw, &mut sink);

    assert!(sink.contains(&KilnEvent::SensorLost(SensorFault::ShortToGround)));
    assert_eq!(sink.count(|e| matches!(e, KilnEvent::SensorLost(_))), 1);
    assert_eq!(sink.count(|e| *e == KilnEvent::SensorRestored), 2);
    assert!(ctl.status().sensor_ok);
}

#[test]
fn sensor_faulted_from_boot_is_reported_once_per_kind() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    hw.temp = Err(SensorFault::OpenCircuit);
    run(&mut ctl, &mut hw, &mut sink, 0, 2_000, 250);
    assert_eq!(sink.count(|e| *e == KilnEvent::SensorLost(SensorFault::OpenCircuit)), 1);

    hw.temp = Err(SensorFault::ShortToVcc);
    run(&mut ctl, &mut hw, &mut sink, 2_250, 3_000, 250);
    assert!(sink.contains(&KilnEvent::SensorLost(SensorFault::ShortToVcc)));
    assert_eq!(sink.count(|e| matches!(e, KilnEvent::SensorLost(_))), 2);
    assert_eq!(sink.count(|e| *e == KilnEvent::SensorRestored), 0);

    hw.temp = Ok(25.0);
    ctl.tick(3_250, &mut hw, &mut sink);
    assert_eq!(sink.count(|e| *e == KilnEvent::SensorRestored), 1);
    assert!(ctl.status().sensor_ok);
}

#[test]
fn sensor_reads_are_throttled_to_four_hertz() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    run(&mut ctl, &mut hw, &mut sink, 0, 9_990, 10);
    assert_eq!(hw.reads, 40);
}

#[test]
fn stop_switches_heater_off_before_the_next_tick() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    assert!(hw.heater());

    ctl.handle_command(KilnCommand::Stop, 10, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(hw.writes.last(), Some(&false));
    assert!(sink.contains(&KilnEvent::RunStopped));

    run(&mut ctl, &mut hw, &mut sink, 100, 5_000, 100);
    assert!(!hw.heater());
}

#[test]
fn heater_write_failure_latches_output_fault() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    hw.fail_writes = true;
    ctl.tick(0, &mut hw, &mut sink);

    let s = ctl.status();
    assert!(s.safety_trip);
    assert_eq!(s.fault_flags, SafetyFault::OutputFault.mask());
    assert!(!s.heater_on);
    assert!(sink.contains(&KilnEvent::SafetyTripped(SafetyFault::OutputFault.mask())));
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn run_generation_increments_per_start() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    run(&mut ctl, &mut hw, &mut sink, 0, 2_000, 250);
    ctl.start(2_100, &mut sink).unwrap();
    run(&mut ctl, &mut hw, &mut sink, 2_250, 4_000, 250);
    ctl.stop(&mut hw, &mut sink);
    ctl.start(4_100, &mut sink).unwrap();

    assert_eq!(ctl.generation(), 2);
    assert!(sink.contains(&KilnEvent::RunStarted { generation: 2 }));

    let gens: Vec<u32> = ctl.history().iter().map(|s| s.generation).collect();
    assert_eq!(gens, vec![0, 0, 0, 1, 1]);
}

#[test]
fn out_of_range_setpoint_is_rejected() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    let res = ctl.handle_command(KilnCommand::SetSetpoint(2500.0), 0, &mut hw, &mut sink);
    assert!(matches!(res, Err(Error::InvalidInput(_))));
    assert_eq!(ctl.status().setpoint_c, 200.0);

    ctl.handle_command(KilnCommand::SetSetpoint(1040.0), 0, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(ctl.status().setpoint_c, 1040.0);
}

#[test]
fn tuning_is_taken_live_and_auto_saved() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    let store = MockStore::default();
    ctl.tick(0, &mut hw, &mut sink);

    let mut params = KilnConfig::default().pid_parameters();
    params.kp = 12.0;
    params.window_ms = 1000;
    ctl.handle_command(KilnCommand::ApplyTuning(params), 0, &mut hw, &mut sink)
        .unwrap();
    assert!(ctl.is_config_dirty());
    assert!(sink.contains(&KilnEvent::TuningApplied));

    assert!(!ctl.auto_save_if_needed(4_999, &store));
    assert!(ctl.auto_save_if_needed(5_000, &store));
    assert!(!ctl.is_config_dirty());
    assert_eq!(store.saves.get(), 1);
    let saved = store.stored.borrow().clone().unwrap();
    assert_eq!(saved.pid.window_ms, 1000);
    assert_eq!(saved.pid.kp, 12.0);
}

#[test]
fn tuning_outside_config_limits_is_rejected() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    let store = MockStore::default();
    ctl.tick(0, &mut hw, &mut sink);

    let mut params = KilnConfig::default().pid_parameters();
    params.window_ms = 50;
    let res = ctl.handle_command(KilnCommand::ApplyTuning(params), 0, &mut hw, &mut sink);
    assert!(matches!(
        res,
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
    assert!(!sink.contains(&KilnEvent::TuningApplied));
    assert!(!ctl.is_config_dirty());
    assert_eq!(ctl.current_config(), KilnConfig::default());

    // Out-of-range duty bounds pass the regulator's own check but not the
    // config's.
    let mut params = KilnConfig::default().pid_parameters();
    params.out_max = 150.0;
    assert!(ctl.apply_tuning(params, &mut sink).is_err());

    // What is live always round-trips through a full config update.
    let current = ctl.current_config();
    ctl.update_config(current, 600, &mut sink).unwrap();
    assert!(ctl.auto_save_if_needed(5_600, &store));
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn invalid_config_update_is_rejected_whole() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    let bad = KilnConfig {
        max_temp_c: 5000.0,
        ..Default::default()
    };
    let res = ctl.handle_command(KilnCommand::UpdateConfig(bad), 0, &mut hw, &mut sink);
    assert!(matches!(
        res,
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
    assert_eq!(ctl.current_config(), KilnConfig::default());
    assert!(!ctl.is_config_dirty());
}

#[test]
fn config_update_moves_the_interlock_limit() {
    let (mut ctl, mut hw, mut sink) = make_loop(700.0);
    let cfg = KilnConfig {
        max_temp_c: 650.0,
        ..Default::default()
    };
    ctl.update_config(cfg, 0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    assert!(ctl.status().safety_trip);
}

// ── History ───────────────────────────────────────────────────

#[test]
fn history_keeps_the_last_240_samples_in_order() {
    let mut ctl = ControlLoop::new(KilnConfig::default(), 0);
    let mut hw = MockKiln::at(0.0);
    let mut sink = RecordingSink::new();
    for i in 0..300u64 {
        hw.temp = Ok(i as f32);
        ctl.tick(i * 1000, &mut hw, &mut sink);
    }
    let temps: Vec<f32> = ctl.history().iter().map(|s| s.temp_c.unwrap()).collect();
    assert_eq!(temps.len(), 240);
    assert_eq!(temps[0], 60.0);
    assert_eq!(temps[239], 299.0);
    assert!(temps.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn history_is_sampled_at_most_once_per_second() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    run(&mut ctl, &mut hw, &mut sink, 0, 4_999, 7);
    assert_eq!(ctl.history().len(), 5);
}

#[test]
fn csv_export_marks_invalid_readings_nan() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    hw.temp = Err(SensorFault::NotFinite);
    ctl.tick(1_000, &mut hw, &mut sink);

    let csv = ctl.samples_csv();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["rev,tempC,out,heat", "1,25.00,100.0,1", "1,NaN,0.0,0"]);
}
