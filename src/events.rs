//! Event queue feeding the controller's single-owner main loop.
//!
//! Events are produced by:
//! - the [`Scheduler`](crate::scheduler::Scheduler) (control tick, blink toggle)
//! - the activation input watcher thread (input edges)
//! - the signal handler (shutdown)
//!
//! and consumed one at a time, in FIFO order, by the main loop, which is
//! the only code that touches `ControllerState` or the switch outputs.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Scheduler   │────▶│              │     │              │
//! │ Input watch │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Signals     │────▶│  (bounded)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::ports::{InputEdge, SchedulerDelegate, TimerHandle, TimerKind};

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Events consumed by the controller main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A repeating timer fired.
    Timer(TimerKind),
    /// The activation input changed level.
    Input(InputEdge),
    /// Stop the main loop and drive outputs safe.
    Shutdown,
}

/// Bounded MPMC queue shared between producer threads and the main loop.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_CAP>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event. Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Pop the next event, if any.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl SchedulerDelegate for &EventQueue {
    fn on_timer_fired(&mut self, _handle: TimerHandle, kind: TimerKind) {
        if !self.push(Event::Timer(kind)) {
            log::warn!("Event queue full, dropped {:?} timer", kind);
        }
    }
}

/// Process-wide queue used by the controller binary.
pub static EVENTS: EventQueue = EventQueue::new();
