//! On/off hysteresis for the heater output.
//!
//! Both edges are compared against the *peak* (hotter) probe:
//!
//! ```text
//!   output on  and peak >= setpoint          → off
//!   output off and peak <  setpoint - delta  → on
//!   otherwise                                → hold (dead-band)
//! ```

/// What the heater output should do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterDecision {
    TurnOn,
    TurnOff,
    Hold,
}

impl HeaterDecision {
    /// The output level after applying this decision to `output_on`.
    pub fn apply(self, output_on: bool) -> bool {
        match self {
            Self::TurnOn => true,
            Self::TurnOff => false,
            Self::Hold => output_on,
        }
    }
}

/// Decide the heater output for one tick.
pub fn decide(output_on: bool, peak: f32, setpoint: f32, delta: f32) -> HeaterDecision {
    if output_on && peak >= setpoint {
        HeaterDecision::TurnOff
    } else if !output_on && peak < setpoint - delta {
        HeaterDecision::TurnOn
    } else {
        HeaterDecision::Hold
    }
}
