//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured kiln events to the `log`
//! facade (serial console on the board, `env_logger` on the host). A
//! dashboard push or message-bus adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::KilnEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`KilnEvent`] as a single line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &KilnEvent) {
        match event {
            KilnEvent::RunStarted { generation } => info!("RUN | started gen={}", generation),
            KilnEvent::RunStopped => info!("RUN | stopped"),
            KilnEvent::StartRefused(fault) => warn!("RUN | start refused: {}", fault),
            KilnEvent::StepEntered {
                index,
                count,
                target_c,
            } => info!("STEP | {}/{} target={:.1}", index + 1, count, target_c),
            KilnEvent::ProfileFinished => info!("RUN | profile finished"),
            KilnEvent::ProfileLoaded { steps } => info!("PROFILE | loaded steps={}", steps),
            KilnEvent::ProfileCleared => info!("PROFILE | cleared"),
            KilnEvent::ModeChanged(mode) => info!("MODE | {:?}", mode),
            KilnEvent::SafetyTripped(flags) => error!("FAULT | latched, flags=0b{:08b}", flags),
            KilnEvent::TripCleared(flags) => info!("FAULT | cleared 0b{:08b}", flags),
            KilnEvent::SensorLost(fault) => warn!("SENSOR | lost: {}", fault),
            KilnEvent::SensorRestored => info!("SENSOR | ok"),
            KilnEvent::TuningApplied => info!("PID | tuning applied"),
            KilnEvent::ConfigUpdated => info!("CONFIG | updated"),
        }
    }
}
