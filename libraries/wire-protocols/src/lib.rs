//! Wire formats shared by the sensor node firmware and the host tools.
//!
//! * [`payload`]: the uplink frame built from the latest sensor readings
//! * [`radio`]: the AT command set of the Sigfox radio module

#![cfg_attr(not(test), no_std)]

pub mod payload;
pub mod radio;

pub use payload::{FieldFormat, MAX_PAYLOAD_LEN};
