//! Unified error and fault types for the sauna controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! binaries' startup error handling uniform. All variants are `Copy` so they
//! can be passed through the control core without allocation.
//!
//! Faults are not errors: they never propagate out of a tick. They are
//! accumulated by the safety supervisor and drive the state machine instead.

use core::fmt;

use crate::app::ports::{ConfigError, PortError};

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible startup / adapter operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A switch or input line could not be read or written.
    Port(PortError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(e) => write!(f, "port: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<PortError> for Error {
    fn from(e: PortError) -> Self {
        Self::Port(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults force the heater off and put the controller into
/// `Faulted`. They are tracked as a bitfield so the supervisor can log each
/// kind being set and cleared independently.
///
/// Declaration order is reporting priority (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum FaultKind {
    /// Sensor reads missing for `dropout_threshold` consecutive ticks.
    SensorDropout = 0b0000_0001,
    /// Hotter sensor above the absolute maximum temperature.
    OverTemperature = 0b0000_0010,
    /// The two sensors disagree by more than the divergence limit.
    Divergence = 0b0000_0100,
    /// The independent watchdog process is not running.
    WatchdogDown = 0b0000_1000,
}

impl FaultKind {
    /// All kinds in reporting-priority order.
    pub const ALL: [FaultKind; 4] = [
        Self::SensorDropout,
        Self::OverTemperature,
        Self::Divergence,
        Self::WatchdogDown,
    ];

    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorDropout => write!(f, "sensor dropout"),
            Self::OverTemperature => write!(f, "over temperature"),
            Self::Divergence => write!(f, "sensor divergence"),
            Self::WatchdogDown => write!(f, "watchdog down"),
        }
    }
}
