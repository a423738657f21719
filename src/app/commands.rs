//! Inbound commands to the application service.
//!
//! These represent things that happen between control ticks (input
//! edges, blink timer) that the
//! [`ControllerService`](super::service::ControllerService) interprets and
//! acts upon on the main loop.

use super::ports::InputEdge;

/// Commands that the main loop feeds into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// An input changed level. Only the configured activation input is
    /// acted upon.
    InputChanged(InputEdge),

    /// The indicator blink timer fired.
    BlinkToggle,
}
