//! Wisol SFM10R Sigfox module, AT commands over a UART.

use crate::config;
use defmt::{error, Format};
use embassy_stm32::{
    mode, peripherals,
    usart::{self, Uart},
};
use embassy_time::{with_timeout, Duration};
use heapless::String;
use wire_protocols::radio::{Command, Response, MAX_COMMAND_LEN, MAX_RESPONSE_LEN};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Format)]
pub enum Error {
    /// Command doesn't fit the command buffer
    CommandTooLong,
    /// Empty or unparsable response
    Response,
    /// The module answered with an error
    Rejected,
    /// No response in time
    Timeout,
    Serial(usart::Error),
}

pub type DefaultWisol = Wisol<'static, peripherals::USART3>;

pub struct Wisol<'d, Serial>
where
    Serial: usart::BasicInstance,
{
    cmd_buffer: String<MAX_COMMAND_LEN>,
    resp_buffer: [u8; MAX_RESPONSE_LEN],
    serial: Uart<'d, Serial, mode::Async>,
}

impl<'d, Serial> Wisol<'d, Serial>
where
    Serial: usart::BasicInstance,
{
    pub fn new(serial: Uart<'d, Serial, mode::Async>) -> Self {
        Self {
            cmd_buffer: String::new(),
            resp_buffer: [0; MAX_RESPONSE_LEN],
            serial,
        }
    }

    /// Sends `cmd` and waits for the module's single line response.
    pub async fn execute(&mut self, cmd: &Command<'_>) -> Result<Response<'_>, Error> {
        self.cmd_buffer.clear();
        cmd.emit(&mut self.cmd_buffer)
            .map_err(|_| Error::CommandTooLong)?;

        self.serial.write(self.cmd_buffer.as_bytes()).await?;

        // A downlink frame only arrives after the network's receive window
        let timeout = match cmd {
            Command::SendFrame { downlink: true, .. } => {
                Duration::from_secs(config::RADIO_DOWNLINK_TIMEOUT_SEC)
            }
            _ => Duration::from_millis(config::RADIO_RESPONSE_TIMEOUT_MS),
        };
        let bytes_read = with_timeout(timeout, self.serial.read_until_idle(&mut self.resp_buffer))
            .await
            .map_err(|_| Error::Timeout)??;

        match Response::parse_bytes(&self.resp_buffer[..bytes_read]) {
            None => {
                error!("Wisol: bad response ({} bytes)", bytes_read);
                Err(Error::Response)
            }
            Some(Response::Error) => Err(Error::Rejected),
            Some(resp) => Ok(resp),
        }
    }
}

impl From<usart::Error> for Error {
    fn from(value: usart::Error) -> Self {
        Error::Serial(value)
    }
}
