//! Host superloop for kilnctl.
//!
//! Runs the control core against a simulated kiln and prints the sample
//! history as CSV when the firing ends.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SimulatedKiln        LogEventSink   MemoryConfigStore   │
//! │  (Temperature+Heater) (EventSink)    (ConfigPort)        │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │          ControlLoop (pure logic)              │      │
//! │  │  Sensor · Profile · Safety · PID · Window      │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use kilnctl::adapters::config_store::MemoryConfigStore;
use kilnctl::adapters::log_sink::LogEventSink;
use kilnctl::adapters::sim_kiln::{KilnModel, SimulatedKiln};
use kilnctl::adapters::time::MonotonicClock;
use kilnctl::app::ports::ConfigPort;
use kilnctl::config::KilnConfig;
use kilnctl::profile::Profile;
use kilnctl::ControlLoop;

/// Fire a simulated kiln with the production control loop
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config.json to import (defaults otherwise)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Firing profile: [{"targetC": .., "holdSec": ..}, ..]
    #[arg(short, long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Direct-mode setpoint (°C), used when no profile is given
    #[arg(short, long)]
    setpoint: Option<f32>,

    /// Simulated firing length (seconds)
    #[arg(short, long, default_value_t = 3600)]
    duration: u64,

    /// Control tick period (milliseconds)
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Kiln starting / ambient temperature (°C)
    #[arg(long, default_value_t = 20.0)]
    ambient: f32,

    /// Pace ticks against the wall clock instead of simulating time
    #[arg(long)]
    realtime: bool,

    /// Write the CSV history here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );
    let args = Args::parse();

    info!("kilnctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Config (file → validated store → loop) ─────────────
    let store = MemoryConfigStore::new();
    if let Some(path) = &args.config {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        store
            .import_json(&json)
            .with_context(|| format!("importing {}", path.display()))?;
    }
    let config = store.load().unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        KilnConfig::default()
    });

    // ── 2. Adapters and core ──────────────────────────────────
    let clock = MonotonicClock::new();
    let mut now_ms = 0;
    let mut kiln = SimulatedKiln::new(KilnModel {
        ambient_c: args.ambient,
        ..KilnModel::default()
    });
    let mut sink = LogEventSink::new();
    let mut ctl = ControlLoop::new(config, now_ms);

    if let Some(path) = &args.profile {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let profile = Profile::from_json(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        ctl.apply_profile(profile, now_ms, &mut sink);
    } else if let Some(setpoint) = args.setpoint {
        ctl.set_setpoint(setpoint)?;
    }

    ctl.start(now_ms, &mut sink)?;

    // ── 3. Superloop ──────────────────────────────────────────
    let end_ms = args.duration.saturating_mul(1000);
    let mut last_report_s = 0;
    while now_ms <= end_ms {
        kiln.advance(now_ms);
        ctl.tick(now_ms, &mut kiln, &mut sink);
        ctl.auto_save_if_needed(now_ms, &store);

        let s = ctl.status();
        if now_ms / 1000 >= last_report_s + 60 {
            last_report_s = now_ms / 1000;
            info!(
                "t={}s T={:.1}C SP={:.1}C out={:.1}% step={}/{} remaining={}s",
                last_report_s,
                s.kiln_c.unwrap_or(f32::NAN),
                s.setpoint_c,
                s.duty,
                s.progress.active_step + 1,
                s.progress.step_count,
                s.progress.remaining_secs,
            );
        }
        if !s.run_active {
            break;
        }

        if args.realtime {
            std::thread::sleep(Duration::from_millis(args.tick_ms));
            now_ms = clock.now_ms();
        } else {
            now_ms += args.tick_ms.max(1);
        }
    }

    ctl.stop(&mut kiln, &mut sink);
    ctl.force_save_if_dirty(&store);
    info!(
        "Firing done: {:.1}C after {}s, element on {}s",
        kiln.temperature_c(),
        now_ms / 1000,
        kiln.heater_on_ms() / 1000
    );

    // ── 4. Export ─────────────────────────────────────────────
    let csv = ctl.samples_csv();
    match &args.output {
        Some(path) => std::fs::write(path, csv)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{csv}"),
    }
    Ok(())
}
