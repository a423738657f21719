//! sauna-watchdog: independent heater fail-safe.
//!
//! Runs as its own process next to `saunactl`. On every check it looks
//! the controller up in the process table and forces the heater switch
//! off unless the controller is definitely running. It never turns the
//! heater on.
//!
//! The controller, in turn, treats this process being absent as a safety
//! fault, so neither can heat on its own.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tracing_subscriber::EnvFilter;

use saunactl::adapters::gpio::PinBank;
use saunactl::adapters::process::SysinfoRegistry;
use saunactl::adapters::time::MonotonicClock;
use saunactl::app::ports::{
    PortError, ProcessRegistry, ProcessStatus, RegistryError, SchedulerDelegate, SwitchPort,
    TimerHandle, TimerKind, TimerPort,
};
use saunactl::config::WatchdogConfig;
use saunactl::error::Error;
use saunactl::scheduler::Scheduler;
use saunactl::watchdog::{WatchdogMonitor, WatchdogVerdict};

/// Longest sleep between scheduler polls, bounds shutdown latency.
const MAX_NAP: Duration = Duration::from_millis(200);

#[derive(Debug, Parser)]
#[command(name = "sauna-watchdog", version, about = "Sauna heater fail-safe watchdog")]
struct Args {
    /// Directory holding the switch line files (shared with saunactl)
    #[arg(long, default_value = "/run/sauna")]
    state_dir: PathBuf,

    /// JSON watchdog configuration; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process name of the controller to supervise
    #[arg(long)]
    controller: Option<String>,

    /// Heater switch id
    #[arg(long)]
    heater_switch: Option<u8>,

    /// Check period in milliseconds
    #[arg(long)]
    interval_ms: Option<u32>,

    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn watchdog_config(&self) -> Result<WatchdogConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => WatchdogConfig::default(),
        };
        if let Some(name) = &self.controller {
            cfg.controller_process.clone_from(name);
        }
        if let Some(id) = self.heater_switch {
            cfg.heater_switch = id;
        }
        if let Some(ms) = self.interval_ms {
            cfg.check_interval_ms = ms;
        }
        cfg.debug |= self.debug;
        cfg.validate()
            .map_err(Error::from)
            .context("invalid watchdog configuration")?;
        Ok(cfg)
    }
}

/// Heater switch plus process table, the only two things the watchdog touches.
struct WatchdogHw {
    pins: PinBank,
    registry: SysinfoRegistry,
}

impl ProcessRegistry for WatchdogHw {
    fn process_status(&mut self, name: &str) -> Result<ProcessStatus, RegistryError> {
        self.registry.process_status(name)
    }
}

impl SwitchPort for WatchdogHw {
    fn switch_output(&mut self, id: u8) -> Result<bool, PortError> {
        self.pins.switch_output(id)
    }

    fn set_switch_output(&mut self, id: u8, on: bool) -> Result<(), PortError> {
        self.pins.set_switch_output(id, on)
    }
}

/// Counts due checks between polls.
#[derive(Default)]
struct DueChecks(u32);

impl SchedulerDelegate for DueChecks {
    fn on_timer_fired(&mut self, _handle: TimerHandle, kind: TimerKind) {
        if kind == TimerKind::WatchdogCheck {
            self.0 += 1;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.watchdog_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.debug { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    info!(
        "sauna-watchdog v{}: supervising '{}', heater switch {}, every {} ms",
        env!("CARGO_PKG_VERSION"),
        config.controller_process,
        config.heater_switch,
        config.check_interval_ms
    );

    let pins = PinBank::open(&args.state_dir, &[config.heater_switch], &[])
        .context("opening heater switch line")?;
    let mut hw = WatchdogHw {
        pins,
        registry: SysinfoRegistry::new(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("installing signal handler")?;

    let mut monitor = WatchdogMonitor::new(config.clone());
    let mut sched = Scheduler::new(MonotonicClock::new());
    sched.schedule_repeating(config.check_interval(), TimerKind::WatchdogCheck);

    // First check right away: the heater must not wait a full period.
    let mut last = monitor.check(&mut hw);

    while running.load(Ordering::SeqCst) {
        let mut due = DueChecks::default();
        sched.poll(&mut due);
        if due.0 > 0 {
            let verdict = monitor.check(&mut hw);
            if verdict != last && verdict.is_healthy() {
                info!("Controller healthy");
            }
            if let WatchdogVerdict::ForceOffFailed(_) = verdict {
                warn!(
                    "Heater state unknown, {} consecutive failed checks",
                    monitor.consecutive_down()
                );
            }
            last = verdict;
        }
        let nap = sched.time_until_next().map_or(MAX_NAP, |d| d.min(MAX_NAP));
        thread::sleep(nap);
    }

    info!("sauna-watchdog stopping after {} checks", monitor.checks());
    Ok(())
}
