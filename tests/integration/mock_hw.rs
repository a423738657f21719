//! Mock hardware adapter for integration tests.
//!
//! Records every switch write so tests can assert on the full command
//! history without touching real relay lines.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use saunactl::app::commands::AppCommand;
use saunactl::app::events::AppEvent;
use saunactl::app::ports::{
    EventSink, InputEdge, InputPort, PortError, ProcessRegistry, ProcessStatus, RegistryError, SensorPort,
    SwitchPort, TimerHandle, TimerKind, TimerPort,
};
use saunactl::app::service::ControllerService;
use saunactl::config::SaunaConfig;
use saunactl::sensors::SensorReading;

// ── MockHw ────────────────────────────────────────────────────

/// Sensors, switches, inputs and the process table in one struct.
pub struct MockHw {
    pub temps: HashMap<u8, SensorReading>,
    pub switches: HashMap<u8, bool>,
    pub inputs: HashMap<u8, bool>,
    pub processes: HashMap<String, ProcessStatus>,
    /// Every `(id, level)` written, in order.
    pub writes: Vec<(u8, bool)>,
    pub fail_writes: bool,
    pub fail_reads: bool,
    pub registry_down: bool,
}

#[allow(dead_code)]
impl MockHw {
    /// Healthy rig for `cfg`: both probes at `temp`, watchdog running.
    pub fn new(cfg: &SaunaConfig, temp: f32) -> Self {
        let mut hw = Self {
            temps: HashMap::new(),
            switches: HashMap::new(),
            inputs: HashMap::new(),
            processes: HashMap::new(),
            writes: Vec::new(),
            fail_writes: false,
            fail_reads: false,
            registry_down: false,
        };
        hw.set_temps(cfg, temp, temp);
        hw.processes
            .insert(cfg.watchdog_process.clone(), ProcessStatus::Running);
        hw
    }

    pub fn set_temps(&mut self, cfg: &SaunaConfig, a: f32, b: f32) {
        self.temps.insert(cfg.sensor_a, SensorReading::Valid(a));
        self.temps.insert(cfg.sensor_b, SensorReading::Valid(b));
    }

    pub fn set_reading(&mut self, id: u8, reading: SensorReading) {
        self.temps.insert(id, reading);
    }

    pub fn set_process(&mut self, name: &str, status: ProcessStatus) {
        self.processes.insert(name.to_string(), status);
    }

    pub fn switch(&self, id: u8) -> bool {
        self.switches.get(&id).copied().unwrap_or(false)
    }

    pub fn writes_to(&self, id: u8) -> Vec<bool> {
        self.writes
            .iter()
            .filter(|(w, _)| *w == id)
            .map(|&(_, on)| on)
            .collect()
    }
}

impl SensorPort for MockHw {
    fn get_temperature(&mut self, sensor_id: u8) -> SensorReading {
        self.temps.get(&sensor_id).copied().unwrap_or_default()
    }
}

impl SwitchPort for MockHw {
    fn switch_output(&mut self, id: u8) -> Result<bool, PortError> {
        if self.fail_reads {
            return Err(PortError::Timeout);
        }
        Ok(self.switch(id))
    }

    fn set_switch_output(&mut self, id: u8, on: bool) -> Result<(), PortError> {
        if self.fail_writes {
            return Err(PortError::Io);
        }
        self.writes.push((id, on));
        self.switches.insert(id, on);
        Ok(())
    }
}

impl InputPort for MockHw {
    fn input_state(&mut self, id: u8) -> Result<bool, PortError> {
        self.inputs
            .get(&id)
            .copied()
            .ok_or(PortError::UnknownComponent(id))
    }
}

impl ProcessRegistry for MockHw {
    fn process_status(&mut self, name: &str) -> Result<ProcessStatus, RegistryError> {
        if self.registry_down {
            return Err(RegistryError::ListFailed);
        }
        Ok(self
            .processes
            .get(name)
            .copied()
            .unwrap_or(ProcessStatus::NotFound))
    }
}

// ── MockTimers ────────────────────────────────────────────────

/// Records scheduled and cancelled timers; never fires on its own.
#[derive(Default)]
pub struct MockTimers {
    next: u32,
    pub live: Vec<(TimerHandle, TimerKind, Duration)>,
    pub cancelled: Vec<TimerHandle>,
}

#[allow(dead_code)]
impl MockTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, kind: TimerKind) -> bool {
        self.live.iter().any(|&(_, k, _)| k == kind)
    }

    pub fn count(&self, kind: TimerKind) -> usize {
        self.live.iter().filter(|&&(_, k, _)| k == kind).count()
    }
}

impl TimerPort for MockTimers {
    fn schedule_repeating(&mut self, interval: Duration, kind: TimerKind) -> TimerHandle {
        self.next += 1;
        let handle = TimerHandle(self.next);
        self.live.push((handle, kind, interval));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(pos) = self.live.iter().position(|&(h, _, _)| h == handle) {
            self.live.remove(pos);
            self.cancelled.push(handle);
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Collects every emitted [`AppEvent`].
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Fixed starting instant plus an offset, so tests control time exactly.
#[allow(dead_code)]
pub struct TestClock {
    start: Instant,
    pub offset: Duration,
}

#[allow(dead_code)]
impl TestClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Duration::ZERO,
        }
    }

    pub fn now(&self) -> Instant {
        self.start + self.offset
    }

    /// Advance by `d` and return the new time.
    pub fn advance(&mut self, d: Duration) -> Instant {
        self.offset += d;
        self.now()
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A started controller wired to mocks.
#[allow(dead_code)]
pub struct Rig {
    pub cfg: SaunaConfig,
    pub app: ControllerService,
    pub hw: MockHw,
    pub timers: MockTimers,
    pub sink: RecordingSink,
    pub clock: TestClock,
}

#[allow(dead_code)]
impl Rig {
    /// Started controller, both probes at `temp`.
    pub fn new(cfg: SaunaConfig, temp: f32) -> Self {
        let clock = TestClock::new();
        let mut hw = MockHw::new(&cfg, temp);
        let mut timers = MockTimers::new();
        let mut sink = RecordingSink::new();
        let mut app = ControllerService::new(cfg.clone(), clock.now());
        app.start(&mut hw, &mut timers, &mut sink)
            .expect("start with healthy mocks");
        Self {
            cfg,
            app,
            hw,
            timers,
            sink,
            clock,
        }
    }

    pub fn tick(&mut self) {
        let now = self.clock.now();
        self.app.tick(&mut self.hw, &mut self.timers, now, &mut self.sink);
    }

    /// Advance the clock by `d`, then tick.
    pub fn tick_after(&mut self, d: Duration) {
        self.clock.advance(d);
        self.tick();
    }

    pub fn edge(&mut self, on: bool) {
        let edge = InputEdge {
            component_id: self.cfg.activation_input,
            new_state: on,
        };
        self.command(AppCommand::InputChanged(edge));
    }

    pub fn command(&mut self, cmd: AppCommand) {
        let now = self.clock.now();
        self.app
            .handle_command(cmd, &mut self.hw, &mut self.timers, now, &mut self.sink);
    }

    pub fn set_temps(&mut self, a: f32, b: f32) {
        let cfg = self.cfg.clone();
        self.hw.set_temps(&cfg, a, b);
    }

    pub fn heater(&self) -> bool {
        self.hw.switch(self.cfg.heater_switch)
    }

    pub fn light(&self) -> bool {
        self.hw.switch(self.cfg.light_switch)
    }
}
