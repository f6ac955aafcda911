//! Sensor aggregation for a cooperative embassy executor.
//!
//! Pollers share one bus through a [`BusArbiter`] and post their readings
//! to the [`Aggregator`], which keeps the latest reading of every sensor in
//! a fixed [`SensorTable`] and periodically hands a [`PayloadEncoder`]
//! payload to the radio task.
//! No heap allocation, every capacity is fixed at build time.

#![cfg_attr(not(test), no_std)]

// This must go first so the macros are visible to the other modules
#[macro_use]
mod fmt;

pub mod aggregator;
pub mod bus;
pub mod config;
pub mod message;
pub mod payload;
pub mod poller;
pub mod sensor;
pub mod table;
pub mod trigger;

pub use aggregator::Aggregator;
pub use bus::BusArbiter;
pub use config::AggregatorConfig;
pub use message::{RadioRequest, SensorReport, TaskMessage};
pub use payload::PayloadEncoder;
pub use poller::SensorPoller;
pub use sensor::{PollSchedule, Sensor, SensorId, SensorIds, SensorInfo, SensorReading};
pub use table::SensorTable;
pub use trigger::TransmitTrigger;
