//! Output drivers over `embedded-hal` pins.

pub mod ssr;
pub mod status_led;
