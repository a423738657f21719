//! Integration tests for the ControllerService → FSM → switch pipeline.
//!
//! Covers the lifecycle, activation edges, fault latching, the indicator,
//! and how the controller reacts to the heater being switched behind its
//! back.

use std::time::Duration;

use saunactl::app::commands::AppCommand;
use saunactl::app::events::AppEvent;
use saunactl::app::ports::{InputEdge, PortError, ProcessStatus, TimerKind};
use saunactl::app::service::ControllerService;
use saunactl::config::SaunaConfig;
use saunactl::control::session::SessionEnd;
use saunactl::drivers::indicator::IndicatorMode;
use saunactl::error::FaultKind;
use saunactl::fsm::StateId;

use crate::mock_hw::{MockHw, MockTimers, RecordingSink, Rig};

const TICK: Duration = Duration::from_secs(10);
const HOUR: Duration = Duration::from_secs(3600);

fn heating_rig() -> Rig {
    let mut rig = Rig::new(SaunaConfig::default(), 60.0);
    rig.edge(true);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Heating);
    rig
}

/// Heating rig pushed into `Faulted` by a divergence fault.
fn faulted_rig() -> Rig {
    let mut rig = heating_rig();
    rig.set_temps(50.0, 90.0);
    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Faulted);
    rig
}

// ── Lifecycle ────────────────────────────────────────────────

#[test]
fn start_forces_outputs_off() {
    let cfg = SaunaConfig::default();
    let mut hw = MockHw::new(&cfg, 60.0);
    hw.switches.insert(cfg.heater_switch, true);
    hw.switches.insert(cfg.light_switch, true);
    let mut timers = MockTimers::new();
    let mut sink = RecordingSink::new();

    let mut app = ControllerService::new(cfg.clone(), std::time::Instant::now());
    app.start(&mut hw, &mut timers, &mut sink).unwrap();

    assert_eq!(hw.writes.first(), Some(&(cfg.heater_switch, false)));
    assert!(!hw.switch(cfg.heater_switch));
    assert!(!hw.switch(cfg.light_switch));
    assert_eq!(app.state(), StateId::Idle);
    assert_eq!(timers.count(TimerKind::ControlTick), 1);
    assert!(matches!(sink.events[0], AppEvent::Started(StateId::Idle)));
}

#[test]
fn start_fails_when_heater_cannot_be_forced_off() {
    let cfg = SaunaConfig::default();
    let mut hw = MockHw::new(&cfg, 60.0);
    hw.fail_writes = true;
    let mut timers = MockTimers::new();
    let mut sink = RecordingSink::new();

    let mut app = ControllerService::new(cfg, std::time::Instant::now());
    assert_eq!(
        app.start(&mut hw, &mut timers, &mut sink),
        Err(PortError::Io)
    );
    assert!(!timers.is_live(TimerKind::ControlTick));
}

#[test]
fn shutdown_drives_outputs_off_and_cancels_tick() {
    let mut rig = heating_rig();
    assert!(rig.heater());
    assert!(rig.light());

    rig.app.shutdown(&mut rig.hw, &mut rig.timers, &mut rig.sink);

    assert!(!rig.heater());
    assert!(!rig.light());
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.timers.is_live(TimerKind::ControlTick));
    assert!(rig.timers.live.is_empty());
}

#[test]
fn telemetry_every_tick() {
    let mut rig = heating_rig();
    rig.tick_after(TICK);
    rig.tick_after(TICK);

    let telem: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(telem.len(), 3);
    let last = telem[2];
    assert_eq!(last.state, StateId::Heating);
    assert!(last.heater_on);
    assert_eq!(last.session_secs, 20);
    assert_eq!(last.remaining_secs, rig.cfg.max_runtime().as_secs() - 20);
    assert_eq!(last.fault_flags, 0);
    assert_eq!(rig.app.tick_count(), 3);
}

// ── Activation ───────────────────────────────────────────────

#[test]
fn activation_enters_cooling_until_first_tick() {
    let mut rig = Rig::new(SaunaConfig::default(), 60.0);
    rig.edge(true);

    assert!(rig.app.session_active());
    assert_eq!(rig.app.state(), StateId::Cooling);
    assert!(!rig.heater());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SessionStarted)), 1);
}

#[test]
fn deactivation_turns_heater_off_immediately() {
    let mut rig = heating_rig();
    assert!(rig.heater());

    rig.edge(false);

    assert!(!rig.heater(), "no tick needed to stop heating");
    assert!(!rig.light());
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.session_active());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SessionEnded(SessionEnd::Deactivated))),
        1
    );
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::StateChanged {
            from: StateId::Heating,
            to: StateId::Idle
        }
    )));
}

#[test]
fn repeated_activation_restarts_runtime() {
    let mut rig = heating_rig();

    rig.clock.advance(4 * HOUR);
    rig.edge(true);
    assert_eq!(rig.app.state(), StateId::Heating, "stays in its state");

    // 5 h 1 s after the first activation, 1 h 1 s after the second.
    rig.tick_after(HOUR + Duration::from_secs(1));
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
}

#[test]
fn edges_on_other_inputs_are_ignored() {
    let mut rig = Rig::new(SaunaConfig::default(), 60.0);
    let other = rig.cfg.activation_input.wrapping_add(1);
    rig.command(AppCommand::InputChanged(InputEdge {
        component_id: other,
        new_state: true,
    }));
    assert!(!rig.app.session_active());
    assert_eq!(rig.app.state(), StateId::Idle);
}

// ── Fault latching ───────────────────────────────────────────

#[test]
fn activation_rejected_while_faulted() {
    let mut rig = faulted_rig();
    rig.sink.clear();

    rig.edge(true);

    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(!rig.app.session_active());
    assert!(!rig.heater());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ActivationRejected { fault_flags } if *fault_flags == FaultKind::Divergence.mask()
    )));
}

#[test]
fn faulted_latches_until_activation_edge() {
    let mut rig = faulted_rig();

    rig.set_temps(60.0, 60.0);
    rig.tick_after(TICK);
    assert!(!rig.app.faults().is_faulted());
    assert_eq!(rig.app.state(), StateId::Faulted, "clearing alone does not re-arm");
    assert!(!rig.heater());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FaultCleared)), 1);

    rig.edge(true);
    assert_eq!(rig.app.state(), StateId::Cooling);
    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
}

#[test]
fn off_edge_after_fault_clears_returns_to_idle() {
    let mut rig = faulted_rig();
    rig.set_temps(60.0, 60.0);
    rig.tick_after(TICK);

    rig.edge(false);
    assert_eq!(rig.app.state(), StateId::Idle);
}

#[test]
fn off_edge_with_fault_active_stays_faulted() {
    let mut rig = faulted_rig();
    rig.edge(false);
    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(!rig.heater());
}

#[test]
fn fault_without_session_enters_faulted() {
    let mut rig = Rig::new(SaunaConfig::default(), 60.0);
    let name = rig.cfg.watchdog_process.clone();
    rig.hw.set_process(&name, ProcessStatus::Stopped);

    rig.tick();
    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(matches!(
        rig.app.indicator_mode(),
        IndicatorMode::Blinking(_)
    ));
    assert!(!rig.heater());
}

// ── Indicator ────────────────────────────────────────────────

#[test]
fn blink_toggles_only_while_faulted() {
    let mut rig = faulted_rig();
    let light = rig.cfg.light_switch;
    assert_eq!(rig.timers.count(TimerKind::BlinkToggle), 1);

    let before = rig.light();
    rig.command(AppCommand::BlinkToggle);
    assert_eq!(rig.light(), !before);
    rig.command(AppCommand::BlinkToggle);
    assert_eq!(rig.light(), before);

    // Still faulted: no second blink timer.
    rig.tick_after(TICK);
    assert_eq!(rig.timers.count(TimerKind::BlinkToggle), 1);

    // Fault clears with no session: light off, timer gone.
    rig.set_temps(60.0, 60.0);
    rig.tick_after(TICK);
    assert_eq!(rig.app.indicator_mode(), IndicatorMode::Off);
    assert!(!rig.timers.is_live(TimerKind::BlinkToggle));
    assert!(!rig.light());

    // A stale toggle after cancellation changes nothing.
    let writes = rig.hw.writes_to(light).len();
    rig.command(AppCommand::BlinkToggle);
    assert_eq!(rig.hw.writes_to(light).len(), writes);
}

#[test]
fn light_is_solid_during_session() {
    let mut rig = heating_rig();
    assert_eq!(rig.app.indicator_mode(), IndicatorMode::Solid);
    rig.set_temps(80.0, 80.0);
    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Cooling);
    assert!(rig.light(), "solid while the session lasts, heater on or off");
}

// ── Heater read-back ─────────────────────────────────────────

#[test]
fn external_override_is_respected_in_dead_band() {
    let mut rig = heating_rig();
    let heater = rig.cfg.heater_switch;
    rig.set_temps(78.0, 78.0);
    rig.tick_after(TICK);
    assert!(rig.heater());

    // Someone else (the watchdog, a manual switch) turns it off.
    rig.hw.switches.insert(heater, false);
    let writes = rig.hw.writes_to(heater).len();

    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Cooling);
    assert!(!rig.app.is_heater_on());
    assert!(!rig.heater());
    assert_eq!(rig.hw.writes_to(heater).len(), writes);
}

#[test]
fn unreadable_heater_is_rewritten() {
    let mut rig = heating_rig();
    let heater = rig.cfg.heater_switch;
    let writes = rig.hw.writes_to(heater).len();

    rig.hw.fail_reads = true;
    rig.tick_after(TICK);

    assert_eq!(rig.hw.writes_to(heater).len(), writes + 1);
    assert!(rig.heater());
}
