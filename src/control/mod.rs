//! Closed-loop heating control: the PID regulator and the SSR window.

pub mod pid;
pub mod window;
