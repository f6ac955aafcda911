//! SHT40 temperature and humidity sensor.
//!
//! The driver doesn't own the bus, every transaction borrows it from the
//! caller so it can sit behind the shared bus arbiter.

use crate::drivers::I2cBus;
use defmt::Format;
use embassy_stm32::i2c;
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use sensor_aggregation::{sensor::copy_values, Sensor};

const SHT40_I2C_ADDRESS: u8 = 0x44;

// 4.5 Command Overview, max durations
const SOFT_RESET_TIME_MS: u64 = 1;
const MEASURE_HIGH_PRECISION_TIME_MS: u64 = 9;
const SERIAL_NUMBER_TIME_MS: u64 = 1;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Format)]
enum Command {
    SoftReset,
    MeasureHighPrecision,
    SerialNumber,
}

impl Command {
    fn as_tuple(self) -> (u8, u64) {
        match self {
            Command::SoftReset => (0x94, SOFT_RESET_TIME_MS),
            Command::MeasureHighPrecision => (0xFD, MEASURE_HIGH_PRECISION_TIME_MS),
            Command::SerialNumber => (0x89, SERIAL_NUMBER_TIME_MS),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Format)]
pub enum Error {
    /// Wrong CRC
    Crc,
    /// I2C bus error
    I2c(i2c::Error),
}

#[derive(Copy, Clone, PartialEq, Debug, Format)]
pub struct Measurement {
    /// Degrees C
    pub temperature: f32,
    /// Relative humidity in percent, 0..=100
    pub humidity: f32,
}

/// Which half of a measurement a poller reports
#[derive(Copy, Clone, Eq, PartialEq, Debug, Format)]
pub enum Quantity {
    Temperature,
    Humidity,
}

#[derive(Debug)]
pub struct Sht40 {
    quantity: Quantity,
}

impl Sht40 {
    pub const fn new(quantity: Quantity) -> Self {
        Self { quantity }
    }

    pub async fn soft_reset<I2C>(&mut self, i2c: &mut I2C) -> Result<(), Error>
    where
        I2C: I2c<Error = i2c::Error>,
    {
        self.write_cmd(i2c, Command::SoftReset).await
    }

    pub async fn serial_number<I2C>(&mut self, i2c: &mut I2C) -> Result<u32, Error>
    where
        I2C: I2c<Error = i2c::Error>,
    {
        let mut buf = [0; 6];
        self.read_cmd(i2c, Command::SerialNumber, &mut buf).await?;
        Ok(u32::from_be_bytes([buf[0], buf[1], buf[3], buf[4]]))
    }

    pub async fn measure<I2C>(&mut self, i2c: &mut I2C) -> Result<Measurement, Error>
    where
        I2C: I2c<Error = i2c::Error>,
    {
        let mut buf = [0; 6];
        self.read_cmd(i2c, Command::MeasureHighPrecision, &mut buf)
            .await?;
        Ok(Measurement {
            temperature: convert_temperature(u16::from_be_bytes([buf[0], buf[1]])),
            humidity: convert_humidity(u16::from_be_bytes([buf[3], buf[4]])),
        })
    }

    async fn write_cmd<I2C>(&mut self, i2c: &mut I2C, cmd: Command) -> Result<(), Error>
    where
        I2C: I2c<Error = i2c::Error>,
    {
        let (command, delay) = cmd.as_tuple();
        i2c.write(SHT40_I2C_ADDRESS, &[command]).await?;
        Timer::after_millis(delay).await;
        Ok(())
    }

    async fn read_cmd<I2C>(&mut self, i2c: &mut I2C, cmd: Command, data: &mut [u8]) -> Result<(), Error>
    where
        I2C: I2c<Error = i2c::Error>,
    {
        self.write_cmd(i2c, cmd).await?;
        i2c.read(SHT40_I2C_ADDRESS, data).await?;
        sensirion_i2c::crc8::validate(data).map_err(|_| Error::Crc)?;
        Ok(())
    }
}

impl Sensor<I2cBus> for Sht40 {
    type Error = Error;

    async fn init(&mut self, bus: &mut I2cBus) -> Result<(), Error> {
        self.soft_reset(bus).await?;
        let sn = self.serial_number(bus).await?;
        defmt::debug!("SHT40: {} serial number {}", self.quantity, sn);
        Ok(())
    }

    async fn poll(&mut self, bus: &mut I2cBus, values: &mut [f32]) -> Result<usize, Error> {
        let m = self.measure(bus).await?;
        let value = match self.quantity {
            Quantity::Temperature => m.temperature,
            Quantity::Humidity => m.humidity,
        };
        Ok(copy_values(&[value], values))
    }
}

fn convert_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

fn convert_humidity(raw: u16) -> f32 {
    (-6.0 + 125.0 * f32::from(raw) / 65535.0).clamp(0.0, 100.0)
}

impl From<i2c::Error> for Error {
    fn from(value: i2c::Error) -> Self {
        Error::I2c(value)
    }
}
