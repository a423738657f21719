//! Indicator light driver.
//!
//! ## Modes
//!
//! | Mode       | When                        | Output                    |
//! |------------|-----------------------------|---------------------------|
//! | `Blinking` | any fault active            | toggled by a repeating timer |
//! | `Solid`    | session active, no fault    | on                        |
//! | `Off`      | otherwise                   | off                       |
//!
//! The mode is level-triggered: [`IndicatorDriver::sync`] is called after
//! every tick and every activation edge with the current fault/session
//! state, so blinking is active exactly while a fault is. Each toggle reads
//! the light's actual state and writes the inverse; nothing else writes the
//! light while blinking.

use core::time::Duration;

use log::debug;

use crate::app::ports::{PortError, SwitchPort, TimerHandle, TimerKind, TimerPort};

/// What the light is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    Off,
    Solid,
    Blinking(Duration),
}

pub struct IndicatorDriver {
    light: u8,
    period: Duration,
    mode: IndicatorMode,
    blink_timer: Option<TimerHandle>,
}

impl IndicatorDriver {
    pub fn new(light: u8, period: Duration) -> Self {
        Self {
            light,
            period,
            mode: IndicatorMode::Off,
            blink_timer: None,
        }
    }

    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.mode, IndicatorMode::Blinking(_))
    }

    /// Bring the light in line with the current fault and session state.
    pub fn sync(
        &mut self,
        faulted: bool,
        session_active: bool,
        timers: &mut impl TimerPort,
        hw: &mut impl SwitchPort,
    ) -> Result<(), PortError> {
        let target = if faulted {
            IndicatorMode::Blinking(self.period)
        } else if session_active {
            IndicatorMode::Solid
        } else {
            IndicatorMode::Off
        };
        if target == self.mode {
            return Ok(());
        }

        if let Some(handle) = self.blink_timer.take() {
            timers.cancel(handle);
            debug!("Indicator blinking stopped");
        }

        match target {
            IndicatorMode::Blinking(period) => {
                self.blink_timer = Some(timers.schedule_repeating(period, TimerKind::BlinkToggle));
                debug!("Indicator blinking started ({} ms)", period.as_millis());
            }
            IndicatorMode::Solid => hw.set_switch_output(self.light, true)?,
            IndicatorMode::Off => hw.set_switch_output(self.light, false)?,
        }
        self.mode = target;
        Ok(())
    }

    /// Handle a blink timer firing: read the light, write the inverse.
    /// Ignored unless the driver is blinking.
    pub fn toggle(&mut self, hw: &mut impl SwitchPort) -> Result<(), PortError> {
        if self.blink_timer.is_none() {
            return Ok(());
        }
        let current = hw.switch_output(self.light)?;
        hw.set_switch_output(self.light, !current)
    }
}
