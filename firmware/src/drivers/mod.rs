use embassy_stm32::{i2c, mode, peripherals};

pub mod sht40;
pub mod wisol;

/// The I2C bus shared by every sensor
pub type I2cBus = i2c::I2c<'static, peripherals::I2C2, mode::Async>;
