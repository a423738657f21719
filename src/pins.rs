//! Default component assignment.
//!
//! Component ids as wired on the reference relay module. The heater
//! contactor and the green indicator lamp are switch outputs, the wall
//! switch is input 0, and the two probes are add-on temperature
//! channels 100 and 101.

// ── Switch outputs ────────────────────────────────────────────
pub const HEATER_SWITCH: u8 = 0;
pub const LIGHT_SWITCH: u8 = 1;

// ── Inputs ────────────────────────────────────────────────────
pub const ACTIVATION_INPUT: u8 = 0;

// ── Temperature channels ──────────────────────────────────────
pub const SENSOR_A: u8 = 100;
pub const SENSOR_B: u8 = 101;
