//! Safety supervisor.
//!
//! The supervisor runs **every tick before the FSM** and produces a
//! [`FaultReport`] that is written into `ControllerState.faults`. The FSM
//! state handlers check it to decide whether to transition to `Faulted`.
//!
//! ## Evaluation order
//!
//! 1. Either reading missing: bump the dropout counter. Below the
//!    threshold the tick is *transient*: no fault, and no other check runs
//!    (there is not enough data). At the threshold: `SensorDropout`.
//! 2. Both readings valid: the dropout counter resets.
//! 3. Probe spread above `divergence_limit`: `Divergence`.
//! 4. Hotter probe above `absolute_max_c`: `OverTemperature`.
//! 5. Watchdog process not alive: `WatchdogDown`.
//!
//! The primary fault is the highest-priority flag
//! (dropout > over-temperature > divergence > watchdog-down); every flag
//! keeps its reason for the log.
//!
//! [`evaluate`] is a pure function of its inputs. The dropout counter is
//! the only state carried between ticks and it is passed in and returned
//! explicitly, so evaluating the same inputs twice gives the same answer.

use core::fmt;

use heapless::Vec;
use log::{error, info, warn};

use crate::config::SaunaConfig;
use crate::error::FaultKind;
use crate::sensors::{SensorPair, SensorReading};

// ---------------------------------------------------------------------------
// Dropout counter
// ---------------------------------------------------------------------------

/// Consecutive ticks with at least one missing reading.
///
/// Saturates at the configured threshold, so it never exceeds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropoutCounter(u8);

impl DropoutCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    fn bumped(self, threshold: u8) -> Self {
        Self(self.0.saturating_add(1).min(threshold))
    }
}

// ---------------------------------------------------------------------------
// Fault report
// ---------------------------------------------------------------------------

/// Why a fault flag is set, with the numbers that tripped it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaultReason {
    SensorDropout {
        consecutive: u8,
        a: SensorReading,
        b: SensorReading,
    },
    OverTemperature {
        limit: f32,
        actual: f32,
    },
    Divergence {
        limit: f32,
        actual: f32,
    },
    WatchdogDown,
}

impl FaultReason {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::SensorDropout { .. } => FaultKind::SensorDropout,
            Self::OverTemperature { .. } => FaultKind::OverTemperature,
            Self::Divergence { .. } => FaultKind::Divergence,
            Self::WatchdogDown => FaultKind::WatchdogDown,
        }
    }
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorDropout { consecutive, a, b } => write!(
                f,
                "invalid or missing sensor data after {} consecutive readings (a={:?}, b={:?})",
                consecutive, a, b
            ),
            Self::OverTemperature { limit, actual } => write!(
                f,
                "max allowed temperature exceeded (limit {:.1}, actual {:.1})",
                limit, actual
            ),
            Self::Divergence { limit, actual } => write!(
                f,
                "sensor temperature difference exceeded limit (limit {:.1}, actual {:.1})",
                limit, actual
            ),
            Self::WatchdogDown => write!(f, "watchdog process is not running"),
        }
    }
}

/// Result of one tick's fault evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultReport {
    flags: u8,
    reasons: Vec<FaultReason, 4>,
}

impl FaultReport {
    /// No fault.
    pub fn clear() -> Self {
        Self::default()
    }

    fn push(&mut self, reason: FaultReason) {
        self.flags |= reason.kind().mask();
        // Capacity equals the number of kinds and each kind is pushed at
        // most once per evaluation.
        let _ = self.reasons.push(reason);
    }

    /// True if **any** fault is active.
    pub fn is_faulted(&self) -> bool {
        self.flags != 0
    }

    /// Highest-priority active fault, if any.
    pub fn primary(&self) -> Option<FaultKind> {
        FaultKind::ALL.into_iter().find(|k| self.has(*k))
    }

    /// Check if a specific fault is active.
    pub fn has(&self, kind: FaultKind) -> bool {
        self.flags & kind.mask() != 0
    }

    /// Active fault bitmask.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Every active reason, for logging.
    pub fn reasons(&self) -> &[FaultReason] {
        &self.reasons
    }
}

// ---------------------------------------------------------------------------
// Pure evaluation
// ---------------------------------------------------------------------------

/// Evaluate one tick. See the module docs for the order of checks.
pub fn evaluate(
    readings: SensorPair,
    counter: DropoutCounter,
    watchdog_alive: bool,
    config: &SaunaConfig,
) -> (FaultReport, DropoutCounter) {
    let mut report = FaultReport::clear();

    // ── 1. Dropout ────────────────────────────────────────────
    let (Some(spread), Some(peak)) = (readings.spread(), readings.peak()) else {
        let threshold = config.dropout_threshold;
        let counter = counter.bumped(threshold);
        if counter.value() >= threshold {
            report.push(FaultReason::SensorDropout {
                consecutive: counter.value(),
                a: readings.a,
                b: readings.b,
            });
        }
        return (report, counter);
    };

    // ── 2. Both valid ─────────────────────────────────────────
    let counter = DropoutCounter::new();

    // ── 3. Divergence ─────────────────────────────────────────
    let divergence = (spread > config.divergence_limit).then_some(FaultReason::Divergence {
        limit: config.divergence_limit,
        actual: spread,
    });

    // ── 4. Over-temperature ───────────────────────────────────
    if peak > config.absolute_max_c {
        report.push(FaultReason::OverTemperature {
            limit: config.absolute_max_c,
            actual: peak,
        });
    }
    if let Some(reason) = divergence {
        report.push(reason);
    }

    // ── 5. Watchdog liveness ──────────────────────────────────
    if !watchdog_alive {
        report.push(FaultReason::WatchdogDown);
    }

    (report, counter)
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Safety supervisor: owns the dropout counter and logs fault transitions.
pub struct SafetySupervisor {
    counter: DropoutCounter,
    /// Flags from the previous evaluation, for set/cleared logging.
    last_flags: u8,
}

impl Default for SafetySupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self {
            counter: DropoutCounter::new(),
            last_flags: 0,
        }
    }

    /// Evaluate all safety conditions for this tick.
    pub fn evaluate(
        &mut self,
        readings: SensorPair,
        watchdog_alive: bool,
        config: &SaunaConfig,
    ) -> FaultReport {
        let (report, counter) = evaluate(readings, self.counter, watchdog_alive, config);
        self.counter = counter;

        if !report.is_faulted() && counter.value() > 0 {
            warn!(
                "Sensor data missing (attempt {}/{}), a={:?} b={:?}",
                counter.value(),
                config.dropout_threshold,
                readings.a,
                readings.b
            );
        }

        for kind in FaultKind::ALL {
            let was = self.last_flags & kind.mask() != 0;
            let is = report.has(kind);
            if is && !was {
                error!("SAFETY FAULT SET: {kind}");
            } else if was && !is {
                info!("SAFETY FAULT CLEARED: {kind}");
            }
        }
        self.last_flags = report.flags();

        report
    }

    /// Current dropout counter.
    pub fn dropout_count(&self) -> u8 {
        self.counter.value()
    }
}
