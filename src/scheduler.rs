//! Repeating-timer engine.
//!
//! Implements [`TimerPort`] for the controller and the watchdog. The
//! scheduler notifies a [`SchedulerDelegate`] when timers fire; the main
//! loop implements the delegate to push events into the queue.
//!
//! ```text
//!  ControllerService ──schedule_repeating──▶ Scheduler
//!                                              │ poll()
//!                                              ▼
//!                                     SchedulerDelegate
//!                               (main loop pushes into EventQueue)
//! ```
//!
//! ## Non-reentrant
//!
//! A timer fires at most once per [`Scheduler::poll`], and its next due
//! time is computed from the poll time, not from the missed deadline. A
//! tick that overruns its period therefore delays the next one instead
//! of queueing a burst, so ticks never overlap.

use core::time::Duration;
use std::time::Instant;

use heapless::Vec;
use log::{debug, error};

use crate::app::ports::{Clock, SchedulerDelegate, TimerHandle, TimerKind, TimerPort};

/// Maximum number of concurrent timers (control tick, blink, watchdog).
const MAX_TIMERS: usize = 4;

/// Internal bookkeeping for a live timer.
#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    handle: TimerHandle,
    kind: TimerKind,
    interval: Duration,
    next_due: Instant,
}

/// The scheduler engine.
pub struct Scheduler<C: Clock> {
    clock: C,
    timers: Vec<TimerEntry, MAX_TIMERS>,
    next_id: u32,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Fire every due timer once, then reschedule it from now.
    /// Returns the number of timers fired.
    pub fn poll(&mut self, delegate: &mut dyn SchedulerDelegate) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        for entry in self.timers.iter_mut() {
            if now >= entry.next_due {
                entry.next_due = now + entry.interval;
                delegate.on_timer_fired(entry.handle, entry.kind);
                fired += 1;
            }
        }
        fired
    }

    /// Earliest pending deadline, for sizing the main loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|e| e.next_due).min()
    }

    /// Time until the next deadline, zero if one is already due.
    pub fn time_until_next(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.next_deadline()
            .map(|due| due.saturating_duration_since(now))
    }

    /// Number of live timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> TimerPort for Scheduler<C> {
    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let entry = TimerEntry {
            handle,
            kind,
            interval,
            next_due: self.clock.now() + interval,
        };
        if self.timers.push(entry).is_err() {
            error!("Scheduler: no free slot for {:?} timer", kind);
        } else {
            debug!(
                "Scheduler: {:?} every {} ms (handle {})",
                kind,
                interval.as_millis(),
                handle.0
            );
        }
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(pos) = self.timers.iter().position(|e| e.handle == handle) {
            let entry = self.timers.swap_remove(pos);
            debug!("Scheduler: cancelled {:?} (handle {})", entry.kind, handle.0);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
