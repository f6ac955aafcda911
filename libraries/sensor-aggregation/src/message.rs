use crate::config::{INBOX_CHANNEL_SIZE, MAX_PAYLOAD_LEN, MAX_STARTUP_COMMANDS, RADIO_CHANNEL_SIZE};
use crate::payload::Payload;
use crate::sensor::{SensorId, SensorReading};
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::Vec;
use wire_protocols::radio::Command;

/// A reading posted by a poller
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReport {
    pub id: SensorId,
    pub reading: SensorReading,
}

impl SensorReport {
    pub fn new(id: SensorId, reading: SensorReading) -> Self {
        Self { id, reading }
    }

    /// The startup report, posted once by the bootstrap code to start the
    /// radio registration
    pub const fn begin() -> Self {
        Self {
            id: SensorId::BEGIN,
            reading: SensorReading::new(),
        }
    }

    pub fn is_begin(&self) -> bool {
        self.id.is_begin()
    }
}

/// Everything the aggregator receives through its inbox
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskMessage {
    Report(SensorReport),
    /// Time to hand the current payload to the radio
    Transmit,
}

impl From<SensorReport> for TaskMessage {
    fn from(r: SensorReport) -> Self {
        TaskMessage::Report(r)
    }
}

pub type StartupCommands = Vec<Command<'static>, MAX_STARTUP_COMMANDS>;

/// Work for the radio task
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioRequest {
    /// Registration handshake, sent once after power up
    Startup(StartupCommands),
    Payload {
        data: Payload<MAX_PAYLOAD_LEN>,
        expect_downlink: bool,
    },
}

pub type Inbox<M> = Channel<M, TaskMessage, INBOX_CHANNEL_SIZE>;
pub type InboxSender<'a, M> = Sender<'a, M, TaskMessage, INBOX_CHANNEL_SIZE>;
pub type InboxReceiver<'a, M> = Receiver<'a, M, TaskMessage, INBOX_CHANNEL_SIZE>;

pub type RadioChannel<M> = Channel<M, RadioRequest, RADIO_CHANNEL_SIZE>;
pub type RadioSender<'a, M> = Sender<'a, M, RadioRequest, RADIO_CHANNEL_SIZE>;
pub type RadioReceiver<'a, M> = Receiver<'a, M, RadioRequest, RADIO_CHANNEL_SIZE>;
