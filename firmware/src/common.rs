use crate::drivers::{sht40::Sht40, I2cBus};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use sensor_aggregation::{
    message::{Inbox, RadioChannel, RadioReceiver},
    Aggregator, BusArbiter, SensorPoller,
};

// Everything below is only shared between tasks on the same executor

pub type SharedI2cBus = BusArbiter<NoopRawMutex, I2cBus>;

pub type AggregatorInbox = Inbox<NoopRawMutex>;

pub type RadioRequestChannel = RadioChannel<NoopRawMutex>;
pub type RadioRequestReceiver = RadioReceiver<'static, NoopRawMutex>;

pub type DefaultAggregator = Aggregator<'static, NoopRawMutex>;
pub type Sht40Poller = SensorPoller<'static, NoopRawMutex, I2cBus, Sht40>;
