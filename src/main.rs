//! saunactl: sauna heater controller.
//!
//! Hexagonal architecture with a single-owner, event-driven main loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HostHardware              LogEventSink   KvsStore             │
//! │  (Sensor+Switch+Input+     (EventSink)    (Config+Storage)     │
//! │   ProcessRegistry)                                             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           ControllerService (pure logic)               │    │
//! │  │  FSM · Safety · Hysteresis · Runtime · Indicator       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · input watcher thread · signals  │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use saunactl::adapters::gpio::PinBank;
use saunactl::adapters::hardware::HostHardware;
use saunactl::adapters::kvs::KvsStore;
use saunactl::adapters::log_sink::LogEventSink;
use saunactl::adapters::process::SysinfoRegistry;
use saunactl::adapters::time::MonotonicClock;
use saunactl::adapters::w1_sensor::W1Sensors;
use saunactl::app::commands::AppCommand;
use saunactl::app::ports::{Clock, ConfigPort, TimerKind};
use saunactl::app::service::ControllerService;
use saunactl::config::SaunaConfig;
use saunactl::drivers::activation::ActivationInput;
use saunactl::error::Error;
use saunactl::events::{EVENTS, Event};
use saunactl::scheduler::Scheduler;

/// Longest the main loop sleeps between scheduler polls.
const MAX_NAP: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "saunactl", version, about = "Sauna heater controller")]
struct Args {
    /// Directory holding the switch and input line files
    #[arg(long, default_value = "/run/sauna")]
    state_dir: PathBuf,

    /// Key-value store directory (defaults to <state-dir>/kvs)
    #[arg(long)]
    kvs_dir: Option<PathBuf>,

    /// Directory of temperature probe files, one per sensor id
    #[arg(long, default_value = "/run/sauna/w1")]
    sensor_dir: PathBuf,

    /// Activation input poll period in milliseconds
    #[arg(long, default_value_t = 100)]
    input_poll_ms: u64,

    /// Verbose logging (overrides the stored debug flag)
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

fn load_config(dir: PathBuf) -> SaunaConfig {
    let store = match KvsStore::open(dir) {
        Ok(store) => store,
        Err(e) => {
            warn!("Config store unavailable ({}), using defaults", e);
            return SaunaConfig::default();
        }
    };
    match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SaunaConfig::default()
        }
    }
}

/// Poll the activation input on its own thread and forward edges.
fn spawn_input_watcher(
    state_dir: PathBuf,
    input: u8,
    period: Duration,
) -> Result<thread::JoinHandle<()>> {
    let mut pins = PinBank::open(&state_dir, &[], &[input])
        .context("opening activation input")?;
    let handle = thread::Builder::new()
        .name("input-watch".into())
        .spawn(move || {
            let mut activation = ActivationInput::new(input);
            let mut failing = false;
            loop {
                match activation.poll(&mut pins) {
                    Ok(edge) => {
                        failing = false;
                        if let Some(edge) = edge {
                            if !EVENTS.push(Event::Input(edge)) {
                                warn!("Event queue full, activation edge dropped");
                            }
                        }
                    }
                    Err(e) if !failing => {
                        warn!(
                            "Activation input unreadable ({}), holding level {:?}",
                            e,
                            activation.level()
                        );
                        failing = true;
                    }
                    Err(_) => {}
                }
                thread::sleep(period);
            }
        })?;
    Ok(handle)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    info!("saunactl v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let kvs_dir = args
        .kvs_dir
        .clone()
        .unwrap_or_else(|| args.state_dir.join("kvs"));
    let mut config = load_config(kvs_dir);
    config.debug |= args.debug;
    info!(
        "Setpoint {:.1}\u{00b0}C (-{:.1}), max runtime {} min, watchdog '{}'",
        config.temp_setpoint,
        config.temp_delta,
        config.max_runtime_ms / 60_000,
        config.watchdog_process
    );

    // ── 2. Adapters ───────────────────────────────────────────
    let pins = PinBank::open(
        &args.state_dir,
        &[config.heater_switch, config.light_switch],
        &[config.activation_input],
    )
    .context("opening switch lines")?;
    let mut hw = HostHardware::new(
        pins,
        W1Sensors::new(&args.sensor_dir),
        SysinfoRegistry::new(),
    );
    let mut sched = Scheduler::new(MonotonicClock::new());
    let mut sink = LogEventSink::new(config.debug);

    // ── 3. Controller ─────────────────────────────────────────
    let mut app = ControllerService::new(config.clone(), sched.clock().now());
    app.start(&mut hw, &mut sched, &mut sink)
        .map_err(Error::from)
        .context("heater could not be forced off at startup")?;

    // ── 4. Producers ──────────────────────────────────────────
    ctrlc::set_handler(|| {
        if !EVENTS.push(Event::Shutdown) {
            error!("Event queue full, shutdown request dropped");
        }
    })
    .context("installing signal handler")?;
    spawn_input_watcher(
        args.state_dir.clone(),
        config.activation_input,
        Duration::from_millis(args.input_poll_ms),
    )?;

    info!("Entering event loop");

    // ── 5. Event loop ─────────────────────────────────────────
    let mut delegate = &EVENTS;
    'main: loop {
        sched.poll(&mut delegate);

        while let Some(event) = EVENTS.pop() {
            let now = sched.clock().now();
            match event {
                Event::Timer(TimerKind::ControlTick) => {
                    app.tick(&mut hw, &mut sched, now, &mut sink);
                }
                Event::Timer(TimerKind::BlinkToggle) => {
                    app.handle_command(AppCommand::BlinkToggle, &mut hw, &mut sched, now, &mut sink);
                }
                Event::Timer(TimerKind::WatchdogCheck) => {}
                Event::Input(edge) => {
                    app.handle_command(
                        AppCommand::InputChanged(edge),
                        &mut hw,
                        &mut sched,
                        now,
                        &mut sink,
                    );
                }
                Event::Shutdown => {
                    info!("Shutdown requested");
                    app.shutdown(&mut hw, &mut sched, &mut sink);
                    break 'main;
                }
            }
        }

        let nap = sched.time_until_next().map_or(MAX_NAP, |d| d.min(MAX_NAP));
        thread::sleep(nap);
    }

    if !EVENTS.is_empty() {
        info!("Discarding {} pending events", EVENTS.len());
    }
    info!(
        "saunactl exited after {} ticks, up {} s",
        app.tick_count(),
        sched.clock().uptime_secs()
    );
    Ok(())
}
