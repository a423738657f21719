//! Temperature reading classification.
//!
//! Every raw value coming off a probe passes through [`classify`] before
//! the control core sees it. Values that are not a measurement at all
//! become [`SensorReading::Missing`]. Any finite temperature, however hot,
//! stays `Valid` so the over-temperature check sees it.

use super::SensorReading;

/// DS18B20 "device disconnected" sentinel (°C).
pub const DISCONNECTED_C: f32 = -127.0;

/// Classify a raw probe value.
///
/// `None`, NaN, infinities and the disconnect sentinel are `Missing`.
pub fn classify(raw: Option<f32>) -> SensorReading {
    match raw {
        Some(c) if c.is_finite() && c != DISCONNECTED_C => SensorReading::Valid(c),
        _ => SensorReading::Missing,
    }
}

/// Parse a 1-Wire style milli-degree value (`"78125"` → 78.125 °C).
pub fn parse_millidegrees(text: &str) -> SensorReading {
    let raw = text
        .trim()
        .parse::<i32>()
        .ok()
        .map(|milli| milli as f32 / 1000.0);
    classify(raw)
}
