//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the binaries route it to stderr through
//! `tracing-subscriber`).

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::SensorReading;

/// Adapter that logs every [`AppEvent`].
///
/// Telemetry is logged at `debug`, or at `info` when `verbose` is set
/// (the config's debug flag).
pub struct LogEventSink {
    verbose: bool,
}

impl LogEventSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn fmt_reading(r: SensorReading) -> String {
    match r {
        SensorReading::Valid(c) => format!("{c:.1}\u{00b0}C"),
        SensorReading::Missing => String::from("--"),
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let line = format!(
                    "TELEM | state={} | T1={} T2={} | heater={} | session={}s left={}s | \
                     dropouts={} | faults=0b{:04b}",
                    t.state.name(),
                    fmt_reading(t.temp_a),
                    fmt_reading(t.temp_b),
                    if t.heater_on { "ON" } else { "OFF" },
                    t.session_secs,
                    t.remaining_secs,
                    t.dropout_count,
                    t.fault_flags,
                );
                if self.verbose {
                    info!("{line}");
                } else {
                    debug!("{line}");
                }
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::FaultDetected(report) => {
                error!(
                    "FAULT | heater stopped, flags=0b{:04b}, reasons:",
                    report.flags()
                );
                for reason in report.reasons() {
                    error!("FAULT |   - {reason}");
                }
            }
            AppEvent::FaultCleared => {
                info!("FAULT | all cleared");
            }
            AppEvent::SessionStarted => {
                info!("SESSION | started");
            }
            AppEvent::SessionEnded(reason) => {
                info!("SESSION | ended ({reason})");
            }
            AppEvent::ActivationRejected { fault_flags } => {
                warn!(
                    "SESSION | activation rejected, faults=0b{:04b}",
                    fault_flags
                );
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state.name());
            }
        }
    }
}
