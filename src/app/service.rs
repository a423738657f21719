//! Application service: the hexagonal core.
//!
//! [`ControllerService`] owns the FSM, safety supervisor, indicator, and
//! the single [`ControllerState`]. It exposes a hardware-agnostic API.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!     SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//! ProcessRegistry ──▶ │    ControllerService     │
//!     SwitchPort ◀──▶ │ Safety · FSM · Indicator │ ──▶ TimerPort
//!                    └──────────────────────────┘
//! ```
//!
//! Every method runs on the main loop thread, so ticks and activation
//! edges are serialized: nothing else mutates the session or the outputs.

use std::time::Instant;

use log::{debug, error, info, warn};

use crate::config::SaunaConfig;
use crate::control::session::SessionEnd;
use crate::drivers::indicator::{IndicatorDriver, IndicatorMode};
use crate::fsm::context::ControllerState;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::{FaultReport, SafetySupervisor};
use crate::sensors::SensorReader;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{
    EventSink, InputEdge, PortError, ProcessRegistry, SensorPort, SwitchPort, TimerHandle,
    TimerKind, TimerPort,
};

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ControllerService {
    fsm: Fsm,
    ctx: ControllerState,
    safety: SafetySupervisor,
    reader: SensorReader,
    indicator: IndicatorDriver,
    control_timer: Option<TimerHandle>,
    tick_count: u64,
}

impl ControllerService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SaunaConfig, now: Instant) -> Self {
        let reader = SensorReader::new(config.sensor_a, config.sensor_b);
        let indicator = IndicatorDriver::new(config.light_switch, config.blink_period());
        let ctx = ControllerState::new(config, now);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            safety: SafetySupervisor::new(),
            reader,
            indicator,
            control_timer: None,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive both outputs off, start the FSM in Idle, and schedule the
    /// periodic control tick.
    ///
    /// Fails if the heater cannot be confirmed off: running with an
    /// unknown heater state is not allowed.
    pub fn start(
        &mut self,
        hw: &mut impl SwitchPort,
        timers: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) -> Result<(), PortError> {
        hw.set_switch_output(self.ctx.config.heater_switch, false)?;
        if let Err(e) = hw.set_switch_output(self.ctx.config.light_switch, false) {
            warn!("Indicator light could not be reset: {}", e);
        }

        self.fsm.start(&mut self.ctx);
        self.control_timer = Some(
            timers.schedule_repeating(self.ctx.config.control_interval(), TimerKind::ControlTick),
        );

        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!(
            "ControllerService started in {} (tick every {} ms)",
            self.fsm.current_state().name(),
            self.ctx.config.control_interval_ms
        );
        Ok(())
    }

    /// Orderly stop: end the session, drive outputs off, cancel timers.
    pub fn shutdown(
        &mut self,
        hw: &mut impl SwitchPort,
        timers: &mut impl TimerPort,
        sink: &mut impl EventSink,
    ) {
        let prev = self.fsm.current_state();
        self.ctx.end_session(SessionEnd::Deactivated);
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.sync_heater(hw);

        if let Some(handle) = self.control_timer.take() {
            timers.cancel(handle);
        }
        // No fault and no session: the indicator goes Off and its timer is cancelled.
        self.ctx.faults = FaultReport::clear();
        self.sync_indicator(timers, hw);

        self.emit_session_end(sink);
        self.emit_state_change(prev, sink);
        info!("ControllerService stopped");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle:
    /// read back heater → read sensors → safety → FSM → outputs → indicator.
    ///
    /// The `hw` parameter satisfies all of [`SensorPort`], [`SwitchPort`],
    /// and [`ProcessRegistry`]; this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + SwitchPort + ProcessRegistry),
        timers: &mut impl TimerPort,
        now: Instant,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        self.ctx.now = now;
        let prev_state = self.fsm.current_state();
        let was_faulted = self.ctx.has_faults();

        // 1. Actual heater state (the watchdog may have forced it off)
        let actual = match hw.switch_output(self.ctx.config.heater_switch) {
            Ok(on) => Some(on),
            Err(e) => {
                warn!("Heater state unreadable: {}", e);
                None
            }
        };
        if self.ctx.heater_on && actual == Some(false) {
            warn!("Heater found off while commanded on (external override)");
            self.ctx.heater_on = false;
        }

        // 2. Read sensors via SensorPort
        self.ctx.readings = self.reader.read_pair(hw);

        // 3. Safety evaluation
        let watchdog_alive = hw.is_running(&self.ctx.config.watchdog_process);
        self.ctx.faults = self
            .safety
            .evaluate(self.ctx.readings, watchdog_alive, &self.ctx.config);

        // 4. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 5. Apply heater output via SwitchPort
        self.apply_heater(hw, actual);

        // 6. Indicator follows the fault/session level
        self.sync_indicator(timers, hw);

        // 7. Events
        let faulted = self.ctx.has_faults();
        if faulted && !was_faulted {
            sink.emit(&AppEvent::FaultDetected(self.ctx.faults.clone()));
        } else if was_faulted && !faulted {
            sink.emit(&AppEvent::FaultCleared);
        }
        self.emit_session_end(sink);
        self.emit_state_change(prev_state, sink);
        sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an event that arrived between ticks.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl SwitchPort,
        timers: &mut impl TimerPort,
        now: Instant,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::InputChanged(edge) => self.on_input(edge, hw, timers, now, sink),
            AppCommand::BlinkToggle => {
                if let Err(e) = self.indicator.toggle(hw) {
                    warn!("Indicator toggle failed: {}", e);
                }
            }
        }
    }

    fn on_input(
        &mut self,
        edge: InputEdge,
        hw: &mut impl SwitchPort,
        timers: &mut impl TimerPort,
        now: Instant,
        sink: &mut impl EventSink,
    ) {
        if edge.component_id != self.ctx.config.activation_input {
            debug!("Ignoring edge on input {}", edge.component_id);
            return;
        }
        self.ctx.now = now;
        let prev = self.fsm.current_state();

        if edge.new_state {
            if self.ctx.has_faults() {
                warn!(
                    "Activation rejected, fault active (flags=0b{:04b})",
                    self.ctx.faults.flags()
                );
                sink.emit(&AppEvent::ActivationRejected {
                    fault_flags: self.ctx.faults.flags(),
                });
                return;
            }
            self.ctx.session.start(now);
            self.ctx.last_end = None;
            if !prev.in_session() {
                // First tick decides between heating and cooling.
                self.fsm.force_transition(StateId::Cooling, &mut self.ctx);
            } else {
                info!("Activation while in session, runtime restarted");
            }
            sink.emit(&AppEvent::SessionStarted);
        } else {
            self.ctx.end_session(SessionEnd::Deactivated);
            if prev.in_session() || !self.ctx.has_faults() {
                self.fsm.force_transition(StateId::Idle, &mut self.ctx);
            }
            self.sync_heater(hw);
        }

        self.sync_indicator(timers, hw);
        self.emit_session_end(sink);
        self.emit_state_change(prev, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            temp_a: self.ctx.readings.a,
            temp_b: self.ctx.readings.b,
            heater_on: self.ctx.heater_on,
            session_secs: self.ctx.session.elapsed(self.ctx.now).as_secs(),
            remaining_secs: self
                .ctx
                .runtime
                .remaining(&self.ctx.session, self.ctx.now)
                .as_secs(),
            dropout_count: self.safety.dropout_count(),
            fault_flags: self.ctx.faults.flags(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Commanded heater output.
    pub fn is_heater_on(&self) -> bool {
        self.ctx.heater_on
    }

    /// True while a control session is active.
    pub fn session_active(&self) -> bool {
        self.ctx.session.is_active()
    }

    /// Latest fault report.
    pub fn faults(&self) -> &FaultReport {
        &self.ctx.faults
    }

    pub fn indicator_mode(&self) -> IndicatorMode {
        self.indicator.mode()
    }

    /// Consecutive ticks with a missing reading.
    pub fn dropout_count(&self) -> u8 {
        self.safety.dropout_count()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SaunaConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Write the commanded heater level if it differs from `actual`.
    fn apply_heater(&mut self, hw: &mut impl SwitchPort, actual: Option<bool>) {
        let want = self.ctx.heater_on;
        if actual == Some(want) {
            return;
        }
        match hw.set_switch_output(self.ctx.config.heater_switch, want) {
            Ok(()) => info!("Heater {}", if want { "ON" } else { "OFF" }),
            Err(e) => error!(
                "Failed to switch heater {}: {}",
                if want { "on" } else { "off" },
                e
            ),
        }
    }

    /// Read the heater back and apply the commanded level.
    fn sync_heater(&mut self, hw: &mut impl SwitchPort) {
        let actual = hw.switch_output(self.ctx.config.heater_switch).ok();
        self.apply_heater(hw, actual);
    }

    fn sync_indicator(&mut self, timers: &mut impl TimerPort, hw: &mut impl SwitchPort) {
        if let Err(e) = self.indicator.sync(
            self.ctx.has_faults(),
            self.ctx.session.is_active(),
            timers,
            hw,
        ) {
            warn!("Indicator update failed: {}", e);
        }
    }

    fn emit_session_end(&mut self, sink: &mut impl EventSink) {
        if let Some(reason) = self.ctx.last_end.take() {
            sink.emit(&AppEvent::SessionEnded(reason));
        }
    }

    fn emit_state_change(&self, from: StateId, sink: &mut impl EventSink) {
        let to = self.fsm.current_state();
        if to != from {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }
}
