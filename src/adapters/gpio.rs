//! File-backed digital lines.
//!
//! Each line is a small text file holding `1` or `0` under a shared state
//! directory:
//!
//! ```text
//!   <state_dir>/switch/<id>   relay outputs (heater, light)
//!   <state_dir>/input/<id>    digital inputs (activation switch)
//! ```
//!
//! The controller and the watchdog open the same directory, so both see
//! the heater's actual state and either can drive it off. A relay board
//! driver (or an operator with `echo 1 > input/0`) sits on the other side.
//!
//! [`FilePin`] implements the `embedded-hal` digital traits; [`PinBank`]
//! maps component ids to pins and exposes them as [`SwitchPort`] and
//! [`InputPort`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin, StatefulOutputPin};
use log::{debug, info};
use tempfile::NamedTempFile;

use crate::app::ports::{InputPort, PortError, SwitchPort};

// ---------------------------------------------------------------------------
// FilePin
// ---------------------------------------------------------------------------

/// Error reading or writing a line file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinError {
    Io(io::ErrorKind),
    /// The file held something other than a level.
    Garbled,
}

impl digital::Error for PinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl From<io::Error> for PinError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.kind())
    }
}

impl From<PinError> for PortError {
    fn from(_: PinError) -> Self {
        PortError::Io
    }
}

/// One digital line stored as a file. A missing file reads as low.
#[derive(Debug, Clone)]
pub struct FilePin {
    path: PathBuf,
}

impl FilePin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_level(&self) -> Result<bool, PinError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => parse_level(&text).ok_or(PinError::Garbled),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write via a uniquely named temporary file and rename, so a reader
    /// never sees a half-written value and concurrent writers never share
    /// a temp path. The last rename wins.
    fn write_level(&self, high: bool) -> Result<(), PinError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(if high { b"1\n" } else { b"0\n" })?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn parse_level(text: &str) -> Option<bool> {
    match text.trim() {
        "1" | "on" | "true" | "high" => Some(true),
        "0" | "off" | "false" | "low" | "" => Some(false),
        _ => None,
    }
}

impl ErrorType for FilePin {
    type Error = PinError;
}

impl OutputPin for FilePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_level(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_level(true)
    }
}

impl StatefulOutputPin for FilePin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.read_level()
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.read_level().map(|high| !high)
    }
}

impl InputPin for FilePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read_level()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read_level().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// PinBank
// ---------------------------------------------------------------------------

/// Switch outputs and inputs by component id.
pub struct PinBank {
    switches: BTreeMap<u8, FilePin>,
    inputs: BTreeMap<u8, FilePin>,
}

impl PinBank {
    /// Open (and create if needed) the line directories under `state_dir`.
    pub fn open(state_dir: &Path, switch_ids: &[u8], input_ids: &[u8]) -> io::Result<Self> {
        let switch_dir = state_dir.join("switch");
        let input_dir = state_dir.join("input");
        fs::create_dir_all(&switch_dir)?;
        fs::create_dir_all(&input_dir)?;

        let switches = switch_ids
            .iter()
            .map(|&id| (id, FilePin::new(switch_dir.join(id.to_string()))))
            .collect();
        let inputs = input_ids
            .iter()
            .map(|&id| (id, FilePin::new(input_dir.join(id.to_string()))))
            .collect();

        info!(
            "PinBank: {} switches, {} inputs under {}",
            switch_ids.len(),
            input_ids.len(),
            state_dir.display()
        );
        Ok(Self { switches, inputs })
    }

    fn switch(&mut self, id: u8) -> Result<&mut FilePin, PortError> {
        self.switches
            .get_mut(&id)
            .ok_or(PortError::UnknownComponent(id))
    }
}

impl SwitchPort for PinBank {
    fn switch_output(&mut self, id: u8) -> Result<bool, PortError> {
        Ok(self.switch(id)?.is_set_high()?)
    }

    fn set_switch_output(&mut self, id: u8, on: bool) -> Result<(), PortError> {
        let pin = self.switch(id)?;
        if on {
            pin.set_high()?;
        } else {
            pin.set_low()?;
        }
        debug!("switch {} -> {}", id, if on { "on" } else { "off" });
        Ok(())
    }
}

impl InputPort for PinBank {
    fn input_state(&mut self, id: u8) -> Result<bool, PortError> {
        let pin = self
            .inputs
            .get_mut(&id)
            .ok_or(PortError::UnknownComponent(id))?;
        Ok(pin.is_high()?)
    }
}
