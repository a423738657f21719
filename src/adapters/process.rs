//! Process-table liveness via `sysinfo`.
//!
//! Both binaries use this: the controller asks whether the watchdog is
//! running, the watchdog asks whether the controller is. Names are matched
//! exactly against the process name (on Linux the 15-byte `comm`).

use std::ffi::OsStr;

use log::debug;
use sysinfo::{ProcessesToUpdate, System};

use crate::app::ports::{ProcessRegistry, ProcessStatus, RegistryError};

pub struct SysinfoRegistry {
    system: System,
}

impl Default for SysinfoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRegistry {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

/// Fold a kernel process state into running / stopped.
fn classify(status: sysinfo::ProcessStatus) -> ProcessStatus {
    match status {
        sysinfo::ProcessStatus::Run
        | sysinfo::ProcessStatus::Sleep
        | sysinfo::ProcessStatus::Idle
        | sysinfo::ProcessStatus::Waking
        | sysinfo::ProcessStatus::UninterruptibleDiskSleep => ProcessStatus::Running,
        _ => ProcessStatus::Stopped,
    }
}

impl ProcessRegistry for SysinfoRegistry {
    fn process_status(&mut self, name: &str) -> Result<ProcessStatus, RegistryError> {
        let refreshed = self.system.refresh_processes(ProcessesToUpdate::All, true);
        if refreshed == 0 {
            // Even a bare system has init; an empty table means the listing failed.
            return Err(RegistryError::ListFailed);
        }

        let mut found = false;
        for process in self.system.processes_by_exact_name(OsStr::new(name)) {
            found = true;
            if classify(process.status()) == ProcessStatus::Running {
                debug!("process '{}' running (pid {})", name, process.pid());
                return Ok(ProcessStatus::Running);
            }
        }
        Ok(if found {
            ProcessStatus::Stopped
        } else {
            ProcessStatus::NotFound
        })
    }
}
