//! Shared mutable context threaded through every FSM handler.
//!
//! `ControllerState` is the single owned struct that state handlers read
//! from and write to: the tick's sensor snapshot and fault report, the
//! control session, the heater output, and configuration. There are no
//! ambient globals; the service owns exactly one of these.

use std::time::Instant;

use crate::config::SaunaConfig;
use crate::control::session::{ControlSession, RuntimeTimer, SessionEnd};
use crate::safety::FaultReport;
use crate::sensors::SensorPair;

/// The shared context passed to every state handler function.
pub struct ControllerState {
    /// Monotonic time of the current tick.
    pub now: Instant,

    // -- Per-tick inputs (written by the service before each FSM tick) --
    pub readings: SensorPair,
    pub faults: FaultReport,

    // -- Session --
    pub session: ControlSession,
    pub runtime: RuntimeTimer,
    /// Why the last session ended, for the log sink.
    pub last_end: Option<SessionEnd>,

    // -- Output --
    /// Commanded heater output. Only the state handlers set this to `true`.
    pub heater_on: bool,

    // -- Configuration --
    pub config: SaunaConfig,
}

impl ControllerState {
    pub fn new(config: SaunaConfig, now: Instant) -> Self {
        Self {
            now,
            readings: SensorPair::default(),
            faults: FaultReport::clear(),
            session: ControlSession::idle(),
            runtime: RuntimeTimer::new(config.max_runtime()),
            last_end: None,
            heater_on: false,
            config,
        }
    }

    /// Returns `true` if **any** safety fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults.is_faulted()
    }

    /// Close the active session (if any) and force the output off.
    pub fn end_session(&mut self, reason: SessionEnd) {
        self.heater_on = false;
        if self.session.is_active() {
            self.session.end();
            self.last_end = Some(reason);
        }
    }

    /// True when the heater may be on at all this tick.
    pub fn output_permitted(&self) -> bool {
        self.session.is_active()
            && !self.has_faults()
            && !self.runtime.expired(&self.session, self.now)
    }
}
