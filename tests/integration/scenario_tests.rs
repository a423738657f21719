//! End-to-end control scenarios: activation → ticks → heater and light.
//!
//! Defaults throughout: setpoint 80 °C, delta 5 °C, divergence limit 30 °C,
//! dropout threshold 5, max runtime 5 h.

use std::time::Duration;

use saunactl::app::events::AppEvent;
use saunactl::app::ports::{ProcessStatus, TimerKind};
use saunactl::config::SaunaConfig;
use saunactl::control::session::SessionEnd;
use saunactl::drivers::indicator::IndicatorMode;
use saunactl::error::FaultKind;
use saunactl::fsm::StateId;
use saunactl::sensors::SensorReading;

use crate::mock_hw::Rig;

const TICK: Duration = Duration::from_secs(10);

fn heating_rig() -> Rig {
    let mut rig = Rig::new(SaunaConfig::default(), 60.0);
    rig.edge(true);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
    rig
}

// ── Dead-band ────────────────────────────────────────────────

#[test]
fn dead_band_keeps_heater_on() {
    let mut rig = heating_rig();
    let writes_before = rig.hw.writes_to(rig.cfg.heater_switch).len();

    rig.set_temps(78.0, 79.0);
    rig.tick_after(TICK);

    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
    assert_eq!(
        rig.hw.writes_to(rig.cfg.heater_switch).len(),
        writes_before,
        "no redundant write while the level is unchanged"
    );
}

#[test]
fn dead_band_keeps_heater_off() {
    let mut rig = Rig::new(SaunaConfig::default(), 0.0);
    rig.set_temps(78.0, 79.0);
    rig.edge(true);
    rig.tick();

    assert_eq!(rig.app.state(), StateId::Cooling);
    assert!(!rig.heater());
}

#[test]
fn hysteresis_cycles_on_peak_probe() {
    let mut rig = heating_rig();

    // Hotter probe reaches the setpoint: off.
    rig.set_temps(70.0, 80.0);
    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Cooling);
    assert!(!rig.heater());

    // Cooler probe is below 75 but the hotter one is not: stay off.
    rig.set_temps(74.0, 76.0);
    rig.tick_after(TICK);
    assert!(!rig.heater());

    // Both below 75: on again.
    rig.set_temps(73.0, 74.9);
    rig.tick_after(TICK);
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
}

// ── Cold start ───────────────────────────────────────────────

#[test]
fn cold_sauna_turns_heater_on() {
    let mut rig = Rig::new(SaunaConfig::default(), 0.0);
    rig.set_temps(60.0, 61.0);
    rig.edge(true);
    assert!(!rig.heater(), "activation alone does not switch the heater");

    rig.tick();
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());
    assert_eq!(rig.app.indicator_mode(), IndicatorMode::Solid);
    assert!(rig.light());
}

// ── Divergence ───────────────────────────────────────────────

#[test]
fn divergence_forces_heater_off_and_blinks() {
    let mut rig = heating_rig();

    rig.set_temps(50.0, 90.0);
    rig.tick_after(TICK);

    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(rig.app.faults().has(FaultKind::Divergence));
    assert!(!rig.heater(), "heater off in the same tick the fault appears");
    assert!(!rig.app.session_active());
    assert!(matches!(
        rig.app.indicator_mode(),
        IndicatorMode::Blinking(_)
    ));
    assert!(rig.timers.is_live(TimerKind::BlinkToggle));
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::SessionEnded(SessionEnd::Faulted(FaultKind::Divergence))
        )),
        1
    );
}

// ── Over-temperature ─────────────────────────────────────────

#[test]
fn runaway_reading_faults_immediately() {
    let mut rig = heating_rig();

    rig.set_temps(205.0, 206.0);
    rig.tick_after(TICK);

    assert!(rig.app.faults().has(FaultKind::OverTemperature));
    assert_eq!(rig.app.dropout_count(), 0, "a hot probe is not a dropout");
    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(!rig.heater());
}

// ── Dropout ──────────────────────────────────────────────────

#[test]
fn dropout_faults_on_threshold_tick() {
    let mut rig = heating_rig();
    let a = rig.cfg.sensor_a;
    rig.hw.set_reading(a, SensorReading::Missing);

    for n in 1..=4 {
        rig.tick_after(TICK);
        assert!(!rig.app.faults().is_faulted(), "tick {n} must not fault");
        assert_eq!(rig.app.dropout_count(), n);
        assert_eq!(rig.app.state(), StateId::Heating);
        assert!(rig.heater(), "output held through a transient dropout");
    }

    rig.tick_after(TICK);
    assert!(rig.app.faults().has(FaultKind::SensorDropout));
    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(!rig.heater());
}

#[test]
fn dropout_counter_resets_on_good_reading() {
    let mut rig = heating_rig();
    let a = rig.cfg.sensor_a;

    rig.hw.set_reading(a, SensorReading::Missing);
    for _ in 0..4 {
        rig.tick_after(TICK);
    }
    assert_eq!(rig.app.dropout_count(), 4);

    rig.set_temps(60.0, 60.0);
    rig.tick_after(TICK);
    assert_eq!(rig.app.dropout_count(), 0);

    rig.hw.set_reading(a, SensorReading::Missing);
    rig.tick_after(TICK);
    assert!(!rig.app.faults().is_faulted());
}

// ── Runtime cutoff ───────────────────────────────────────────

#[test]
fn runtime_cutoff_ends_session() {
    let mut rig = heating_rig();
    let max = rig.cfg.max_runtime();

    // Exactly at the limit the session continues.
    rig.tick_after(max);
    assert_eq!(rig.app.state(), StateId::Heating);
    assert!(rig.heater());

    rig.tick_after(Duration::from_secs(1));
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.heater());
    assert!(!rig.app.session_active());
    assert_eq!(rig.app.indicator_mode(), IndicatorMode::Off);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SessionEnded(SessionEnd::RuntimeExceeded))),
        1
    );

    // Still cold, but no session: stays off.
    rig.tick_after(TICK);
    assert!(!rig.heater());
}

#[test]
fn runtime_cutoff_ignores_temperature() {
    let mut rig = Rig::new(SaunaConfig::default(), 78.0);
    rig.edge(true);
    rig.tick();
    assert_eq!(rig.app.state(), StateId::Cooling);

    let past_limit = rig.cfg.max_runtime() + Duration::from_secs(1);
    rig.tick_after(past_limit);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.session_active());
}

// ── Watchdog liveness ────────────────────────────────────────

#[test]
fn missing_watchdog_faults_the_controller() {
    let mut rig = heating_rig();
    let name = rig.cfg.watchdog_process.clone();
    rig.hw.set_process(&name, ProcessStatus::NotFound);

    rig.tick_after(TICK);
    assert!(rig.app.faults().has(FaultKind::WatchdogDown));
    assert_eq!(rig.app.state(), StateId::Faulted);
    assert!(!rig.heater());
}

#[test]
fn registry_failure_counts_as_watchdog_down() {
    let mut rig = heating_rig();
    rig.hw.registry_down = true;

    rig.tick_after(TICK);
    assert!(rig.app.faults().has(FaultKind::WatchdogDown));
    assert!(!rig.heater());
}
