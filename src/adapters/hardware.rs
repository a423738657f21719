//! Hardware adapter: bridges the host's peripherals to domain port traits.
//!
//! Owns the relay/input lines, the temperature probes and the process
//! table, exposing them through [`SensorPort`], [`SwitchPort`],
//! [`InputPort`] and [`ProcessRegistry`]. The control core takes one
//! `&mut HostHardware` per tick and never sees the concrete devices.

use crate::adapters::gpio::PinBank;
use crate::adapters::process::SysinfoRegistry;
use crate::adapters::w1_sensor::W1Sensors;
use crate::app::ports::{
    InputPort, PortError, ProcessRegistry, ProcessStatus, RegistryError, SensorPort, SwitchPort,
};
use crate::sensors::SensorReading;

/// Concrete adapter that combines all host devices behind port traits.
pub struct HostHardware {
    pins: PinBank,
    sensors: W1Sensors,
    registry: SysinfoRegistry,
}

impl HostHardware {
    pub fn new(pins: PinBank, sensors: W1Sensors, registry: SysinfoRegistry) -> Self {
        Self {
            pins,
            sensors,
            registry,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HostHardware {
    fn get_temperature(&mut self, sensor_id: u8) -> SensorReading {
        self.sensors.get_temperature(sensor_id)
    }
}

// ── SwitchPort / InputPort implementation ─────────────────────

impl SwitchPort for HostHardware {
    fn switch_output(&mut self, id: u8) -> Result<bool, PortError> {
        self.pins.switch_output(id)
    }

    fn set_switch_output(&mut self, id: u8, on: bool) -> Result<(), PortError> {
        self.pins.set_switch_output(id, on)
    }
}

impl InputPort for HostHardware {
    fn input_state(&mut self, id: u8) -> Result<bool, PortError> {
        self.pins.input_state(id)
    }
}

// ── ProcessRegistry implementation ────────────────────────────

impl ProcessRegistry for HostHardware {
    fn process_status(&mut self, name: &str) -> Result<ProcessStatus, RegistryError> {
        self.registry.process_status(name)
    }
}
