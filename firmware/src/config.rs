use static_assertions::const_assert;
use wire_protocols::payload::FieldFormat;

pub const STARTUP_DELAY_SECONDS: u64 = 2;

pub const I2C_FREQUENCY_HZ: u32 = 50_000;

pub const RADIO_BAUD_RATE: u32 = 9600;

pub const TEMPERATURE_POLL_INTERVAL_MS: u64 = 5_000;

/// Zero means event driven, polled every 10 s when no event arrives
pub const HUMIDITY_POLL_INTERVAL_MS: u64 = 0;

/// Sigfox allows 140 uplinks a day, this is 96
pub const TRANSMIT_INTERVAL_SEC: u64 = 15 * 60;

pub const EXPECT_DOWNLINK: bool = false;

/// One decimal place, four digits per field
pub const PAYLOAD_FIELD_SCALE: u16 = 10;
pub const PAYLOAD_FIELD_WIDTH: u8 = 4;

pub const RADIO_RESPONSE_TIMEOUT_MS: u64 = 8_000;
pub const RADIO_DOWNLINK_TIMEOUT_SEC: u64 = 60;

const_assert!(TRANSMIT_INTERVAL_SEC >= 10 * 60);
const_assert!(
    PAYLOAD_FIELD_WIDTH >= FieldFormat::MIN_WIDTH && PAYLOAD_FIELD_WIDTH <= FieldFormat::MAX_WIDTH
);
