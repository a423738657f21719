//! Activation session and the maximum-runtime cutoff.
//!
//! Elapsed time is measured on the monotonic clock, so wall-clock
//! adjustments neither shorten nor extend a session.

use core::fmt;
use core::time::Duration;
use std::time::Instant;

use crate::error::FaultKind;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Activation input went off.
    Deactivated,
    /// Maximum continuous runtime exceeded.
    RuntimeExceeded,
    /// A safety fault forced the session closed.
    Faulted(FaultKind),
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deactivated => write!(f, "deactivated"),
            Self::RuntimeExceeded => write!(f, "max runtime exceeded"),
            Self::Faulted(kind) => write!(f, "fault: {kind}"),
        }
    }
}

/// The single control session. At most one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSession {
    active: bool,
    start_time: Option<Instant>,
}

impl ControlSession {
    pub const fn idle() -> Self {
        Self {
            active: false,
            start_time: None,
        }
    }

    /// Begin a session at `now`. Restarting an active session resets its
    /// start time.
    pub fn start(&mut self, now: Instant) {
        self.active = true;
        self.start_time = Some(now);
    }

    /// Close the session and reset its fields.
    pub fn end(&mut self) {
        *self = Self::idle();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Time since the session started. Zero when no session is active.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.start_time
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}

/// Hard cutoff on continuous session length.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeTimer {
    max_runtime: Duration,
}

impl RuntimeTimer {
    pub fn new(max_runtime: Duration) -> Self {
        Self { max_runtime }
    }

    pub fn max_runtime(&self) -> Duration {
        self.max_runtime
    }

    /// True once an active session has run strictly longer than the limit.
    pub fn expired(&self, session: &ControlSession, now: Instant) -> bool {
        session.is_active() && session.elapsed(now) > self.max_runtime
    }

    /// Time left before the cutoff, zero if expired or inactive.
    pub fn remaining(&self, session: &ControlSession, now: Instant) -> Duration {
        if !session.is_active() {
            return Duration::ZERO;
        }
        self.max_runtime.saturating_sub(session.elapsed(now))
    }
}
