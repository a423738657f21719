//! Heater control primitives used by the FSM state handlers.
//!
//! - [`hysteresis`]: the on/off dead-band decision
//! - [`session`]: activation session and maximum-runtime cutoff

pub mod hysteresis;
pub mod session;
