//! Controller liveness watchdog.
//!
//! Runs in its own process. Every check it asks the process table whether
//! the controller is running; if the answer is anything but a definite
//! "running" it drives the heater switch off. It never turns the heater
//! on, and it does not coordinate with the controller beyond the switch
//! state and the process table.

use log::{debug, error, warn};

use crate::app::ports::{ProcessRegistry, ProcessStatus, RegistryError, SwitchPort};
use crate::config::WatchdogConfig;

/// Outcome of one liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// Controller running, nothing done.
    Healthy,
    /// Controller not running; heater forced off.
    ForcedOff(ControllerDown),
    /// Controller not running, and the heater switch could not be written.
    ForceOffFailed(ControllerDown),
}

impl WatchdogVerdict {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Why the controller counts as down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerDown {
    Stopped,
    NotFound,
    QueryFailed(RegistryError),
}

pub struct WatchdogMonitor {
    config: WatchdogConfig,
    checks: u64,
    consecutive_down: u32,
}

impl WatchdogMonitor {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            checks: 0,
            consecutive_down: 0,
        }
    }

    /// Run one liveness check and enforce the fail-safe.
    pub fn check(&mut self, hw: &mut (impl ProcessRegistry + SwitchPort)) -> WatchdogVerdict {
        self.checks += 1;
        let name = self.config.controller_process.as_str();

        let down = match hw.process_status(name) {
            Ok(ProcessStatus::Running) => {
                if self.consecutive_down > 0 {
                    warn!(
                        "Controller '{}' running again after {} failed checks",
                        name, self.consecutive_down
                    );
                }
                self.consecutive_down = 0;
                debug!("Controller '{}' is running", name);
                return WatchdogVerdict::Healthy;
            }
            Ok(ProcessStatus::Stopped) => {
                error!("Controller '{}' found but not running", name);
                ControllerDown::Stopped
            }
            Ok(ProcessStatus::NotFound) => {
                error!("Controller '{}' not found", name);
                ControllerDown::NotFound
            }
            Err(e) => {
                error!("Failed to query process table: {}", e);
                ControllerDown::QueryFailed(e)
            }
        };
        self.consecutive_down = self.consecutive_down.saturating_add(1);

        // Unconditional: even if the switch already reads off.
        match hw.set_switch_output(self.config.heater_switch, false) {
            Ok(()) => {
                warn!("Heater switch {} forced off", self.config.heater_switch);
                WatchdogVerdict::ForcedOff(down)
            }
            Err(e) => {
                error!(
                    "Could not force heater switch {} off: {}",
                    self.config.heater_switch, e
                );
                WatchdogVerdict::ForceOffFailed(down)
            }
        }
    }

    /// Checks run since startup.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Consecutive checks that found the controller down.
    pub fn consecutive_down(&self) -> u32 {
        self.consecutive_down
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }
}
