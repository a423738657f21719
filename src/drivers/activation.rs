//! Activation input edge detector.
//!
//! The wall switch is a maintained (latching) input: on starts a session,
//! off ends it. The driver polls the level through an [`InputPort`] and
//! reports changes as [`InputEdge`]s. The first read only latches the
//! level, so a switch left on across a restart does not start heating by
//! itself.

use log::info;

use crate::app::ports::{InputEdge, InputPort, PortError};

pub struct ActivationInput {
    input: u8,
    last: Option<bool>,
}

impl ActivationInput {
    pub fn new(input: u8) -> Self {
        Self { input, last: None }
    }

    /// Last latched level, if any read has succeeded.
    pub fn level(&self) -> Option<bool> {
        self.last
    }

    /// Read the input and return an edge if the level changed.
    pub fn poll(&mut self, port: &mut impl InputPort) -> Result<Option<InputEdge>, PortError> {
        let level = port.input_state(self.input)?;
        match self.last.replace(level) {
            None => {
                info!("Activation input {} initial level: {}", self.input, level);
                Ok(None)
            }
            Some(prev) if prev != level => Ok(Some(InputEdge {
                component_id: self.input,
                new_state: level,
            })),
            Some(_) => Ok(None),
        }
    }
}
