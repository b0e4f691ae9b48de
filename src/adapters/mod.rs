//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | TemperatureSource  | Thermocouple converter       |
//! |                | HeaterPort         | SSR + status LED GPIO        |
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `config_store` | ConfigPort         | postcard blob slot           |
//! | `sim_kiln`     | TemperatureSource  | Simulated thermal plant      |
//! |                | HeaterPort         |                              |
//! | `time`         | -                  | Monotonic clock              |

pub mod config_store;
pub mod hardware;
pub mod log_sink;
pub mod sim_kiln;
pub mod time;
