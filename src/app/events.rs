//! Outbound application events.
//!
//! The [`ControllerService`](super::service::ControllerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them; the default
//! [`LogEventSink`](crate::adapters::log_sink::LogEventSink) writes them to
//! the log.

use crate::control::session::SessionEnd;
use crate::fsm::StateId;
use crate::safety::FaultReport;
use crate::sensors::SensorReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Per-tick telemetry snapshot.
    Telemetry(TelemetryData),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// One or more safety faults were raised. Carries every reason.
    FaultDetected(FaultReport),

    /// All safety faults have been cleared.
    FaultCleared,

    /// An activation-on edge started a session.
    SessionStarted,

    /// The session ended.
    SessionEnded(SessionEnd),

    /// An activation-on edge arrived while a fault was active.
    ActivationRejected { fault_flags: u8 },

    /// The application service has started (carries initial state).
    Started(StateId),
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryData {
    pub state: StateId,
    pub temp_a: SensorReading,
    pub temp_b: SensorReading,
    pub heater_on: bool,
    pub session_secs: u64,
    /// Time left before the runtime cutoff, zero outside a session.
    pub remaining_secs: u64,
    pub dropout_count: u8,
    pub fault_flags: u8,
}
