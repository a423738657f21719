//! System configuration parameters
//!
//! All tunable parameters for the sauna controller and its watchdog.
//! Loaded once at startup through a [`ConfigPort`](crate::app::ports::ConfigPort);
//! changing a value requires a controller restart.
//!
//! The JSON form uses short keys so the whole record fits a single
//! key-value slot; the legacy long key names are still accepted on load.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;

/// Schema version written alongside the configuration.
pub const CONFIG_VERSION: f32 = 1.1;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaunaConfig {
    // --- Hysteresis ---
    /// Target sauna temperature (°C)
    #[serde(rename = "ts", alias = "temp_setpoint")]
    pub temp_setpoint: f32,
    /// Dead-band below the setpoint (°C)
    #[serde(rename = "td", alias = "temp_delta")]
    pub temp_delta: f32,

    // --- Runtime ---
    /// Maximum continuous session length (milliseconds)
    #[serde(rename = "to", alias = "timer_on")]
    pub max_runtime_ms: u64,

    // --- Safety ---
    /// Max allowed difference between the two sensors (°C)
    #[serde(rename = "tr", alias = "thermal_runaway")]
    pub divergence_limit: f32,
    /// Absolute max temperature on the hotter sensor (°C)
    #[serde(rename = "tm", alias = "thermal_runaway_max")]
    pub absolute_max_c: f32,
    /// Consecutive ticks with a missing reading before faulting
    #[serde(rename = "ct", alias = "consecutive_null_threshold")]
    pub dropout_threshold: u8,
    /// Process name of the independent watchdog
    #[serde(rename = "sn", alias = "safety_script_name")]
    pub watchdog_process: String,

    // --- Components ---
    /// Switch output driving the heater contactor
    #[serde(rename = "si", alias = "switch_id")]
    pub heater_switch: u8,
    /// Switch output driving the indicator light
    #[serde(rename = "gi", alias = "greenlight_id")]
    pub light_switch: u8,
    /// Activation input
    #[serde(rename = "ii", alias = "input_id")]
    pub activation_input: u8,
    /// First temperature channel
    #[serde(rename = "sa")]
    pub sensor_a: u8,
    /// Second temperature channel
    #[serde(rename = "sb")]
    pub sensor_b: u8,

    // --- Timing ---
    /// Control tick period (milliseconds)
    #[serde(rename = "ci")]
    pub control_interval_ms: u32,
    /// Indicator blink toggle period (milliseconds)
    #[serde(rename = "bp")]
    pub blink_period_ms: u32,

    // --- Misc ---
    /// Verbose per-tick logging
    #[serde(rename = "db", alias = "debug")]
    pub debug: bool,
    /// Force key-value storage even where richer settings storage exists
    #[serde(rename = "mk", alias = "manualKVS")]
    pub manual_kvs: bool,
    /// Schema version of the stored record
    #[serde(rename = "v", alias = "version")]
    pub version: f32,
}

impl Default for SaunaConfig {
    fn default() -> Self {
        Self {
            // Hysteresis
            temp_setpoint: 80.0,
            temp_delta: 5.0,

            // Runtime
            max_runtime_ms: 5 * 60 * 60 * 1000, // 5 h

            // Safety
            divergence_limit: 30.0,
            absolute_max_c: 110.0,
            dropout_threshold: 5,
            watchdog_process: String::from("sauna-watchdog"),

            // Components
            heater_switch: pins::HEATER_SWITCH,
            light_switch: pins::LIGHT_SWITCH,
            activation_input: pins::ACTIVATION_INPUT,
            sensor_a: pins::SENSOR_A,
            sensor_b: pins::SENSOR_B,

            // Timing
            control_interval_ms: 10_000, // 0.1 Hz
            blink_period_ms: 1000,       // 1 Hz

            debug: false,
            manual_kvs: false,
            version: CONFIG_VERSION,
        }
    }
}

impl SaunaConfig {
    pub fn max_runtime(&self) -> Duration {
        Duration::from_millis(self.max_runtime_ms)
    }

    pub fn control_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.control_interval_ms))
    }

    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.blink_period_ms))
    }

    /// Lower edge of the hysteresis dead-band.
    pub fn turn_on_below(&self) -> f32 {
        self.temp_setpoint - self.temp_delta
    }

    /// Range-check every field.
    ///
    /// Invalid values are rejected, never clamped: a stored record must not
    /// be able to widen the safety envelope silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(40.0..=120.0).contains(&self.temp_setpoint) {
            return Err(ConfigError::ValidationFailed(
                "temp_setpoint must be 40–120 °C",
            ));
        }
        if !(1.0..=15.0).contains(&self.temp_delta) {
            return Err(ConfigError::ValidationFailed("temp_delta must be 1–15 °C"));
        }
        let hour_ms = 60 * 60 * 1000;
        if !(hour_ms..=12 * hour_ms).contains(&self.max_runtime_ms) {
            return Err(ConfigError::ValidationFailed(
                "max runtime must be 1–12 hours",
            ));
        }
        if !(10.0..=50.0).contains(&self.divergence_limit) {
            return Err(ConfigError::ValidationFailed(
                "divergence_limit must be 10–50 °C",
            ));
        }
        if !(80.0..=150.0).contains(&self.absolute_max_c) {
            return Err(ConfigError::ValidationFailed(
                "absolute_max_c must be 80–150 °C",
            ));
        }
        if self.absolute_max_c <= self.temp_setpoint {
            return Err(ConfigError::ValidationFailed(
                "absolute_max_c must be above temp_setpoint",
            ));
        }
        if !(1..=20).contains(&self.dropout_threshold) {
            return Err(ConfigError::ValidationFailed(
                "dropout_threshold must be 1–20 readings",
            ));
        }
        if self.watchdog_process.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "watchdog_process must not be empty",
            ));
        }
        if self.heater_switch == self.light_switch {
            return Err(ConfigError::ValidationFailed(
                "heater and light must use different switches",
            ));
        }
        if self.sensor_a == self.sensor_b {
            return Err(ConfigError::ValidationFailed(
                "the two temperature sensors must be distinct",
            ));
        }
        if !(1000..=60_000).contains(&self.control_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_interval_ms must be 1000–60000",
            ));
        }
        if !(100..=10_000).contains(&self.blink_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "blink_period_ms must be 100–10000",
            ));
        }
        Ok(())
    }
}

/// Watchdog process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Process name of the controller being supervised
    pub controller_process: String,
    /// Switch output driving the heater contactor
    pub heater_switch: u8,
    /// Liveness check period (milliseconds)
    pub check_interval_ms: u32,
    pub debug: bool,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            controller_process: String::from("saunactl"),
            heater_switch: pins::HEATER_SWITCH,
            check_interval_ms: 5000,
            debug: false,
        }
    }
}

impl WatchdogConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.check_interval_ms))
    }

    /// Reject configurations the watchdog cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller_process.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "controller process name must not be empty",
            ));
        }
        if self.check_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("check interval must be non-zero"));
        }
        Ok(())
    }
}
