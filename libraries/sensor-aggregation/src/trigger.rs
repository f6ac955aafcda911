use crate::message::{InboxSender, TaskMessage};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};

/// Posts [`TaskMessage::Transmit`] into the aggregator's inbox once every
/// period.
pub struct TransmitTrigger<'a, M: RawMutex> {
    period: Duration,
    inbox: InboxSender<'a, M>,
}

impl<'a, M: RawMutex> TransmitTrigger<'a, M> {
    pub fn new(period: Duration, inbox: InboxSender<'a, M>) -> Self {
        Self { period, inbox }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Never returns
    pub async fn run(self) {
        let mut ticker = Ticker::every(self.period);
        loop {
            ticker.next().await;
            trace!("Transmit period elapsed");
            self.inbox.send(TaskMessage::Transmit).await;
        }
    }
}
