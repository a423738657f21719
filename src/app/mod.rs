//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for the sauna controller: FSM
//! orchestration, safety evaluation, activation handling, and the
//! indicator. All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
