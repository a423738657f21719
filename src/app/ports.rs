//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControllerService (domain)
//! ```
//!
//! Driven adapters (sensors, switches, process table, timers, storage)
//! implement these traits. The [`ControllerService`](super::service::ControllerService)
//! and the [`WatchdogMonitor`](crate::watchdog::WatchdogMonitor) consume them
//! via generics, so the core never touches hardware directly.
//!
//! ## Timeouts
//!
//! Implementations MUST bound every call. A read that cannot complete in
//! time resolves to [`SensorReading::Missing`] or an `Err`, which the core
//! folds into its dropout / fault model. Ports never block a tick.

use core::time::Duration;
use std::time::Instant;

use crate::config::SaunaConfig;
use crate::sensors::SensorReading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the temperature channels.
pub trait SensorPort {
    /// Latest temperature on `sensor_id`. Transport failures resolve to
    /// [`SensorReading::Missing`]; this never errors.
    fn get_temperature(&mut self, sensor_id: u8) -> SensorReading;
}

// ───────────────────────────────────────────────────────────────
// Switch / input ports (driven adapter: domain ↔ relay outputs)
// ───────────────────────────────────────────────────────────────

/// Relay outputs (heater contactor, indicator light).
pub trait SwitchPort {
    /// Actual current state of switch `id`.
    fn switch_output(&mut self, id: u8) -> Result<bool, PortError>;

    /// Command switch `id` on or off.
    fn set_switch_output(&mut self, id: u8, on: bool) -> Result<(), PortError>;
}

/// Digital inputs (activation wall switch).
pub trait InputPort {
    fn input_state(&mut self, id: u8) -> Result<bool, PortError>;
}

/// An input changed level. Delivered to the controller as
/// [`AppCommand::InputChanged`](super::commands::AppCommand::InputChanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdge {
    pub component_id: u8,
    pub new_state: bool,
}

// ───────────────────────────────────────────────────────────────
// Process registry (driven adapter: domain → process table)
// ───────────────────────────────────────────────────────────────

/// What the process table says about a named process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Registered and running.
    Running,
    /// Registered but stopped, zombie, or otherwise not executing.
    Stopped,
    /// No process with that name.
    NotFound,
}

/// Liveness queries against the process table.
///
/// Used in both directions: the controller checks the watchdog, and the
/// watchdog checks the controller.
pub trait ProcessRegistry {
    fn process_status(&mut self, name: &str) -> Result<ProcessStatus, RegistryError>;

    /// `true` only for a definite [`ProcessStatus::Running`]. Stopped,
    /// missing, and failed queries all count as not alive.
    fn is_running(&mut self, name: &str) -> bool {
        matches!(self.process_status(name), Ok(ProcessStatus::Running))
    }
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain → periodic scheduler)
// ───────────────────────────────────────────────────────────────

/// What a repeating timer is for. Delivered back as an event when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic control tick.
    ControlTick,
    /// Indicator blink toggle.
    BlinkToggle,
    /// Watchdog liveness check.
    WatchdogCheck,
}

/// Opaque handle returned by [`TimerPort::schedule_repeating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u32);

/// Repeating-timer primitive.
pub trait TimerPort {
    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerHandle;

    /// Cancel a timer. Cancelling an unknown or already-cancelled handle is
    /// a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Receives timer fire notifications from the [`Scheduler`](crate::scheduler::Scheduler).
///
/// The main loop implements this to push events into the queue, keeping
/// the scheduler decoupled from the event system.
pub trait SchedulerDelegate {
    fn on_timer_fired(&mut self, handle: TimerHandle, kind: TimerKind);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source. Wall-clock adjustments must not move it.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the controller configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] instead of clamping.
pub trait ConfigPort {
    /// Returns [`SaunaConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SaunaConfig, ConfigError>;

    fn save(&self, config: &SaunaConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ key-value store)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Writes MUST be atomic: a crash mid-write leaves the old value.
pub trait StoragePort {
    /// Read a value into `buf`. Returns the number of bytes written.
    fn read(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;

    fn exists(&self, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SwitchPort`] and [`InputPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// No such component id.
    UnknownComponent(u8),
    /// The device did not answer in time.
    Timeout,
    /// Generic I/O error from the transport.
    Io,
}

/// Errors from [`ProcessRegistry`] queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The process table could not be listed.
    ListFailed,
    Timeout,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Key contains characters the backend cannot store.
    InvalidKey,
    /// Caller's buffer is smaller than the stored value.
    BufferTooSmall,
    IoError,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownComponent(id) => write!(f, "unknown component {}", id),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ListFailed => write!(f, "failed to list processes"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidKey => write!(f, "invalid key"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
