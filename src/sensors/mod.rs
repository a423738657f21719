//! Sensor subsystem: reading classification and the dual-probe reader.
//!
//! The [`SensorReader`] produces a fresh [`SensorPair`] each tick that gets
//! written into `ControllerState.readings`. Nothing is retained between
//! ticks here; the only carried sensor state is the dropout counter owned
//! by the safety supervisor.

pub mod temperature;

use crate::app::ports::SensorPort;

/// One probe's value for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SensorReading {
    /// Temperature in °C.
    Valid(f32),
    /// No usable value (transport error, timeout, disconnect sentinel).
    #[default]
    Missing,
}

impl SensorReading {
    pub fn celsius(self) -> Option<f32> {
        match self {
            Self::Valid(c) => Some(c),
            Self::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Both probes' readings for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorPair {
    pub a: SensorReading,
    pub b: SensorReading,
}

impl SensorPair {
    pub fn new(a: SensorReading, b: SensorReading) -> Self {
        Self { a, b }
    }

    /// Both readings, if both are valid.
    pub fn both(&self) -> Option<(f32, f32)> {
        Some((self.a.celsius()?, self.b.celsius()?))
    }

    /// The hotter of the two probes. Governs both hysteresis edges.
    pub fn peak(&self) -> Option<f32> {
        self.both().map(|(a, b)| a.max(b))
    }

    /// Absolute disagreement between the two probes.
    pub fn spread(&self) -> Option<f32> {
        self.both().map(|(a, b)| (a - b).abs())
    }
}

/// Reads the two configured probes through a [`SensorPort`].
pub struct SensorReader {
    sensor_a: u8,
    sensor_b: u8,
}

impl SensorReader {
    pub fn new(sensor_a: u8, sensor_b: u8) -> Self {
        Self { sensor_a, sensor_b }
    }

    /// Read both probes. Values are re-classified so an adapter cannot
    /// smuggle NaN or a disconnect sentinel past the fault layer.
    pub fn read_pair(&self, port: &mut impl SensorPort) -> SensorPair {
        let a = temperature::classify(port.get_temperature(self.sensor_a).celsius());
        let b = temperature::classify(port.get_temperature(self.sensor_b).celsius());
        SensorPair { a, b }
    }
}
