//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  IDLE ──[activation on]──▶ COOLING ◀──[peak >= setpoint]── HEATING
//!    ▲                         │                               ▲
//!    │                         └──[peak < setpoint - delta]────┘
//!    │
//!    └──[deactivated / runtime exceeded]── HEATING | COOLING
//!
//!  Any state ──[safety fault]──▶ FAULTED ──[activation edge, fault clear]──▶ IDLE | COOLING
//! ```
//!
//! Every update handler runs the session guard first: a fault, an ended
//! session, or an exceeded runtime forces the output off and returns
//! before any hysteresis is evaluated.

use log::{debug, info, warn};

use super::context::ControllerState;
use super::{StateDescriptor, StateId};
use crate::control::hysteresis::{self, HeaterDecision};
use crate::control::session::SessionEnd;
use crate::error::FaultKind;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: StateId::Idle.name(),
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Heating
        StateDescriptor {
            id: StateId::Heating,
            name: StateId::Heating.name(),
            on_enter: Some(heating_enter),
            on_exit: None,
            on_update: heating_update,
        },
        // Index 2: Cooling
        StateDescriptor {
            id: StateId::Cooling,
            name: StateId::Cooling.name(),
            on_enter: Some(cooling_enter),
            on_exit: None,
            on_update: cooling_update,
        },
        // Index 3: Faulted
        StateDescriptor {
            id: StateId::Faulted,
            name: StateId::Faulted.name(),
            on_enter: Some(faulted_enter),
            on_exit: Some(faulted_exit),
            on_update: faulted_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Session guard
// ═══════════════════════════════════════════════════════════════════════════

/// Immediate-return checks shared by the session states.
fn session_guard(ctx: &mut ControllerState) -> Option<StateId> {
    if ctx.has_faults() {
        let kind = ctx.faults.primary().unwrap_or(FaultKind::SensorDropout);
        ctx.end_session(SessionEnd::Faulted(kind));
        return Some(StateId::Faulted);
    }
    if !ctx.session.is_active() {
        ctx.end_session(SessionEnd::Deactivated);
        return Some(StateId::Idle);
    }
    if ctx.runtime.expired(&ctx.session, ctx.now) {
        info!(
            "Session exceeded max runtime of {}s, stopping heater",
            ctx.runtime.max_runtime().as_secs()
        );
        ctx.end_session(SessionEnd::RuntimeExceeded);
        return Some(StateId::Idle);
    }
    None
}

/// Run the hysteresis on the peak probe. A transient dropout tick (no
/// fault yet, but no peak either) holds the current output.
fn apply_hysteresis(ctx: &mut ControllerState) {
    let Some(peak) = ctx.readings.peak() else {
        debug!("Hysteresis skipped, sensor data incomplete");
        return;
    };
    let decision = hysteresis::decide(
        ctx.heater_on,
        peak,
        ctx.config.temp_setpoint,
        ctx.config.temp_delta,
    );
    match decision {
        HeaterDecision::TurnOff => debug!("Heater off, max temp: {peak:.1}"),
        HeaterDecision::TurnOn => debug!("Heater on, max temp: {peak:.1}"),
        HeaterDecision::Hold => {}
    }
    ctx.heater_on = decision.apply(ctx.heater_on);
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state: no session, output off
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut ControllerState) {
    ctx.heater_on = false;
    info!("IDLE: no active session, heater off");
}

fn idle_update(ctx: &mut ControllerState) -> Option<StateId> {
    ctx.heater_on = false;
    if ctx.has_faults() {
        return Some(StateId::Faulted);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HEATING state: session active, output on
// ═══════════════════════════════════════════════════════════════════════════

fn heating_enter(ctx: &mut ControllerState) {
    info!(
        "HEATING: target {:.1} °C, peak {:?}",
        ctx.config.temp_setpoint,
        ctx.readings.peak()
    );
}

fn heating_update(ctx: &mut ControllerState) -> Option<StateId> {
    if let Some(next) = session_guard(ctx) {
        return Some(next);
    }
    apply_hysteresis(ctx);
    (!ctx.heater_on).then_some(StateId::Cooling)
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLING state: session active, output off
// ═══════════════════════════════════════════════════════════════════════════

fn cooling_enter(ctx: &mut ControllerState) {
    info!(
        "COOLING: waiting for peak below {:.1} °C",
        ctx.config.turn_on_below()
    );
}

fn cooling_update(ctx: &mut ControllerState) -> Option<StateId> {
    if let Some(next) = session_guard(ctx) {
        return Some(next);
    }
    apply_hysteresis(ctx);
    ctx.heater_on.then_some(StateId::Heating)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULTED state: session forcibly ended, output off
// ═══════════════════════════════════════════════════════════════════════════

fn faulted_enter(ctx: &mut ControllerState) {
    ctx.heater_on = false;
    warn!(
        "FAULTED: heater disabled, fault_flags=0b{:04b}",
        ctx.faults.flags()
    );
}

/// Where a latched fault is released to. An on-edge has already started a
/// fresh session (re-arm into Cooling); an off-edge has ended it (Idle).
pub(super) fn fault_release_target(ctx: &ControllerState) -> StateId {
    if ctx.session.is_active() {
        StateId::Cooling
    } else {
        StateId::Idle
    }
}

fn faulted_exit(ctx: &mut ControllerState) {
    match fault_release_target(ctx) {
        StateId::Cooling => info!("FAULTED: re-armed by activation input, entering Cooling"),
        target => info!("FAULTED: released by deactivation, entering {}", target.name()),
    }
}

fn faulted_update(ctx: &mut ControllerState) -> Option<StateId> {
    // Leaving requires a fresh activation edge; clearing alone is not enough.
    ctx.heater_on = false;
    None
}
