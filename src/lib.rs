//! Sauna heater controller library.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! adapters used by the `saunactl` and `sauna-watchdog` binaries.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod events;
pub mod fsm;
pub mod safety;
pub mod scheduler;
pub mod sensors;
pub mod watchdog;

pub mod error;
pub mod pins;

pub mod adapters;
pub mod drivers;
