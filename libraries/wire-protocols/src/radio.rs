//! The radio protocol covers the AT command set spoken by the Wisol
//! Sigfox module over a UART.
//! Commands and responses are ASCII lines terminated by a carriage return.

use crate::payload::MAX_PAYLOAD_LEN;
use core::fmt;

pub const TERMINATOR: &str = "\r";

/// Longest command line, a downlink-requesting frame of the largest payload
pub const MAX_COMMAND_LEN: usize =
    SEND_FRAME_PREFIX.len() + MAX_PAYLOAD_LEN + DOWNLINK_SUFFIX.len() + TERMINATOR.len();

/// Longest response line the module produces (a downlink frame)
pub const MAX_RESPONSE_LEN: usize = 48;

const SEND_FRAME_PREFIX: &str = "AT$SF=";
const DOWNLINK_SUFFIX: &str = ",1";

/// Commands are sent to the module.
/// The module always answers with a single [`Response`] line.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Wake the module and check it is alive.
    /// Response: OK
    Check,

    /// Request the device ID used to register with the network.
    /// Response: 8 hex digits
    DeviceId,

    /// Request the porting authorization code (PAC) used to register with
    /// the network.
    /// Response: 16 hex digits
    Pac,

    /// Send an uplink frame.
    /// The payload must be an even number of hex digits.
    /// When `downlink` is set the module waits for the network's
    /// acknowledgment and responds with the downlink frame.
    /// Response: OK or a downlink frame
    SendFrame { payload: &'a [u8], downlink: bool },
}

/// Commands sent once after power up to read out the registration details.
pub const STARTUP_SEQUENCE: [Command<'static>; 3] =
    [Command::Check, Command::DeviceId, Command::Pac];

impl Command<'_> {
    /// Writes the full command line, including the terminator.
    pub fn emit<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        write!(w, "{self}")?;
        w.write_str(TERMINATOR)
    }

    /// True when the module answers with a value rather than a plain OK
    pub fn expects_value(&self) -> bool {
        match self {
            Command::Check => false,
            Command::DeviceId | Command::Pac => true,
            Command::SendFrame { downlink, .. } => *downlink,
        }
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Check => f.write_str("AT"),
            Command::DeviceId => f.write_str("AT$I=10"),
            Command::Pac => f.write_str("AT$I=11"),
            Command::SendFrame { payload, downlink } => {
                f.write_str(SEND_FRAME_PREFIX)?;
                for b in payload.iter() {
                    fmt::Write::write_char(f, char::from(*b))?;
                }
                if *downlink {
                    f.write_str(DOWNLINK_SUFFIX)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response<'a> {
    Ok,
    Error,
    /// Any other non-empty line, e.g. the device ID
    Value(&'a str),
}

impl<'a> Response<'a> {
    pub fn parse(line: &'a str) -> Option<Self> {
        match line.trim() {
            "" => None,
            "OK" => Some(Response::Ok),
            l if l.starts_with("ERR") => Some(Response::Error),
            l => Some(Response::Value(l)),
        }
    }

    pub fn parse_bytes(line: &'a [u8]) -> Option<Self> {
        core::str::from_utf8(line).ok().and_then(Self::parse)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error)
    }
}

impl fmt::Display for Response<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => f.write_str("OK"),
            Response::Error => f.write_str("ERROR"),
            Response::Value(v) => f.write_str(v),
        }
    }
}
