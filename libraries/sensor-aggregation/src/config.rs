//! Build-time configuration of the aggregation core.
//! Everything here is fixed at startup and never changes at runtime.

use embassy_time::Duration;
use static_assertions::const_assert;
use wire_protocols::{payload::FieldFormat, radio::STARTUP_SEQUENCE};

/// Number of sensors the aggregator remembers a reading for
pub const MAX_SENSOR_COUNT: usize = 10;

/// Number of values a sensor can report per poll
pub const MAX_SENSOR_DATA_SIZE: usize = 3;

/// Capacity of the staging payload, in digits
pub const MAX_PAYLOAD_LEN: usize = wire_protocols::MAX_PAYLOAD_LEN;

pub const DEFAULT_TRANSMIT_PERIOD_SEC: u64 = 900;

/// How long an event-driven poller waits for its event before polling anyway
pub const DEFAULT_EVENT_TIMEOUT_SEC: u64 = 10;

pub const INBOX_CHANNEL_SIZE: usize = 8;

pub const RADIO_CHANNEL_SIZE: usize = 2;

pub const MAX_STARTUP_COMMANDS: usize = 4;

// Sensor IDs are a u8 with 0 and 0xFF reserved
const_assert!(MAX_SENSOR_COUNT > 0 && MAX_SENSOR_COUNT <= 0xFE);
const_assert!(MAX_SENSOR_DATA_SIZE > 0);
// Reading counts are stored as a u8
const_assert!(MAX_SENSOR_DATA_SIZE <= u8::MAX as usize);
const_assert!(MAX_PAYLOAD_LEN % 2 == 0);
const_assert!(STARTUP_SEQUENCE.len() <= MAX_STARTUP_COMMANDS);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AggregatorConfig {
    /// Interval between two payloads handed to the radio
    pub transmit_period: Duration,
    /// Ask the network for a downlink acknowledgment with every payload
    pub expect_downlink: bool,
    /// Scale and width of every payload field
    pub format: FieldFormat,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            transmit_period: Duration::from_secs(DEFAULT_TRANSMIT_PERIOD_SEC),
            expect_downlink: false,
            format: FieldFormat::DEFAULT,
        }
    }
}
