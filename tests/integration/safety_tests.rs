//! Integration tests for the latched safety interlocks.

use crate::mock_hw::{make_loop, run};

use kilnctl::app::commands::KilnCommand;
use kilnctl::app::events::KilnEvent;
use kilnctl::error::{Error, SafetyFault, SensorFault};

// ── Over-temperature ──────────────────────────────────────────

#[test]
fn overtemp_latches_and_survives_cooling() {
    let (mut ctl, mut hw, mut sink) = make_loop(960.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);

    let s = ctl.status();
    assert!(s.safety_trip);
    assert_eq!(s.fault_flags, SafetyFault::OverTemperature.mask());
    assert!(!s.heater_on);
    assert!(!hw.heater());
    assert!(sink.contains(&KilnEvent::SafetyTripped(0b001)));

    // Cooling back under the limit does not clear the latch.
    hw.temp = Ok(400.0);
    run(&mut ctl, &mut hw, &mut sink, 1_000, 20_000, 1_000);
    assert!(ctl.status().safety_trip);
    assert!(hw.writes.iter().all(|on| !on));

    let refused = ctl.start(21_000, &mut sink);
    assert!(matches!(
        refused,
        Err(Error::Safety(SafetyFault::OverTemperature))
    ));
    assert!(sink.contains(&KilnEvent::StartRefused(SafetyFault::OverTemperature)));

    ctl.clear_trip(&mut sink);
    assert!(sink.contains(&KilnEvent::TripCleared(0b001)));
    hw.temp = Ok(25.0);
    ctl.start(22_000, &mut sink).unwrap();
    ctl.tick(22_000, &mut hw, &mut sink);
    assert!(!ctl.status().safety_trip);
    assert!(hw.heater());
}

#[test]
fn clearing_while_still_hot_relatches_on_next_tick() {
    let (mut ctl, mut hw, mut sink) = make_loop(1_000.0);
    ctl.tick(0, &mut hw, &mut sink);
    assert!(ctl.status().safety_trip);

    ctl.clear_trip(&mut sink);
    assert!(!ctl.status().safety_trip);
    ctl.tick(1_000, &mut hw, &mut sink);
    assert!(ctl.status().safety_trip);
    assert_eq!(sink.count(|e| matches!(e, KilnEvent::SafetyTripped(_))), 2);
}

#[test]
fn exactly_at_limit_does_not_trip() {
    let (mut ctl, mut hw, mut sink) = make_loop(950.0);
    ctl.start(0, &mut sink).unwrap();
    run(&mut ctl, &mut hw, &mut sink, 0, 5_000, 250);
    assert!(!ctl.status().safety_trip);
}

#[test]
fn disabled_interlock_never_trips() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    let mut cfg = ctl.current_config();
    cfg.overtemp_interlock = false;
    ctl.update_config(cfg, 0, &mut sink).unwrap();

    hw.temp = Ok(1_500.0);
    ctl.start(0, &mut sink).unwrap();
    run(&mut ctl, &mut hw, &mut sink, 0, 5_000, 250);
    assert!(!ctl.status().safety_trip);
    assert!(ctl.status().run_active);
}

// ── External trip ─────────────────────────────────────────────

#[test]
fn external_trip_switches_off_before_next_tick() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    assert!(hw.heater());

    ctl.handle_command(
        KilnCommand::Trip(SafetyFault::External),
        100,
        &mut hw,
        &mut sink,
    )
    .unwrap();
    assert!(!hw.heater());
    assert!(ctl.status().safety_trip);
    assert!(sink.contains(&KilnEvent::SafetyTripped(0b010)));

    let refused = ctl.handle_command(KilnCommand::Start, 200, &mut hw, &mut sink);
    assert!(refused.is_err());
    assert!(sink.contains(&KilnEvent::StartRefused(SafetyFault::External)));
}

#[test]
fn faults_accumulate_in_the_mask() {
    let (mut ctl, mut hw, mut sink) = make_loop(1_200.0);
    ctl.tick(0, &mut hw, &mut sink);
    ctl.trip(SafetyFault::External, &mut hw, &mut sink);
    assert_eq!(ctl.status().fault_flags, 0b011);

    ctl.handle_command(KilnCommand::ClearTrip, 500, &mut hw, &mut sink)
        .unwrap();
    assert!(sink.contains(&KilnEvent::TripCleared(0b011)));
    assert_eq!(ctl.status().fault_flags, 0);
}

#[test]
fn trip_overrides_window_phase() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.tick(0, &mut hw, &mut sink);
    assert!(hw.heater());

    // Mid-window, full duty: the trip still wins.
    ctl.trip(SafetyFault::External, &mut hw, &mut sink);
    run(&mut ctl, &mut hw, &mut sink, 250, 1_750, 250);
    assert!(!hw.heater());
    assert!(hw.writes[1..].iter().all(|on| !on));
    assert_eq!(ctl.status().duty, 0.0);
}

#[test]
fn clear_trip_keeps_run_intent() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    ctl.trip(SafetyFault::External, &mut hw, &mut sink);
    ctl.tick(0, &mut hw, &mut sink);
    assert!(ctl.status().run_active);
    assert!(!hw.heater());

    ctl.clear_trip(&mut sink);
    ctl.tick(2_000, &mut hw, &mut sink);
    assert!(hw.heater());
}

// ── Combined failure ──────────────────────────────────────────

#[test]
fn invalid_sensor_and_trip_keep_heater_off() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    hw.temp = Err(SensorFault::ShortToVcc);
    ctl.trip(SafetyFault::External, &mut hw, &mut sink);
    run(&mut ctl, &mut hw, &mut sink, 0, 10_000, 250);

    let s = ctl.status();
    assert!(!s.sensor_ok);
    assert!(s.safety_trip);
    assert!(!s.heater_on);
    assert!(hw.writes.iter().all(|on| !on));
    // An invalid reading alone never latches over-temperature.
    assert_eq!(s.fault_flags, SafetyFault::External.mask());
}

#[test]
fn stuck_output_refuses_restart_until_cleared() {
    let (mut ctl, mut hw, mut sink) = make_loop(25.0);
    ctl.start(0, &mut sink).unwrap();
    hw.fail_writes = true;
    ctl.tick(0, &mut hw, &mut sink);
    assert!(ctl.status().safety_trip);

    hw.fail_writes = false;
    ctl.stop(&mut hw, &mut sink);
    assert!(ctl.start(1_000, &mut sink).is_err());
    ctl.clear_trip(&mut sink);
    assert!(ctl.start(2_000, &mut sink).is_ok());
}
