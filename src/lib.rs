//! Single-zone electric kiln controller.
//!
//! Thermocouple acquisition, PID regulation, SSR time-proportioning and
//! multi-step firing profiles, all driven from one cooperative control
//! tick. The domain core lives in [`app`]; hardware sits behind the port
//! traits in [`app::ports`] and is supplied by [`adapters`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod history;
pub mod pins;
pub mod profile;
pub mod safety;
pub mod scheduler;
pub mod sensors;

pub use app::service::ControlLoop;
pub use error::{Error, Result};
