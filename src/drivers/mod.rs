//! Drivers for the operator-facing peripherals: the activation switch and
//! the indicator light.

pub mod activation;
pub mod indicator;
