//! The aggregator task.
//!
//! Every poller and the transmit trigger feed one inbox.
//! Reports update the sensor table, a transmit message turns the table into
//! a payload for the radio. The begin report skips the table and starts the
//! radio's registration handshake instead.
//!
//! Nothing here blocks on the radio: a full radio queue drops the payload.

use crate::config::{AggregatorConfig, MAX_PAYLOAD_LEN, MAX_SENSOR_COUNT};
use crate::message::{Inbox, RadioRequest, RadioSender, SensorReport, StartupCommands, TaskMessage};
use crate::payload::PayloadEncoder;
use crate::table::SensorTable;
use crate::trigger::TransmitTrigger;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use wire_protocols::radio::STARTUP_SEQUENCE;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Waiting,
    ProcessingData,
    ProcessingTimer,
}

pub struct Aggregator<'a, M: RawMutex, const N: usize = MAX_SENSOR_COUNT> {
    config: AggregatorConfig,
    state: State,
    table: SensorTable<N>,
    encoder: PayloadEncoder<MAX_PAYLOAD_LEN>,
    inbox: &'a Inbox<M>,
    radio: RadioSender<'a, M>,
    /// Startup commands not yet accepted by the radio queue
    pending: StartupCommands,
    registered: bool,
}

impl<'a, M: RawMutex, const N: usize> Aggregator<'a, M, N> {
    pub fn new(config: AggregatorConfig, inbox: &'a Inbox<M>, radio: RadioSender<'a, M>) -> Self {
        Self {
            config,
            state: State::Waiting,
            table: SensorTable::new(),
            encoder: PayloadEncoder::new(config.format),
            inbox,
            radio,
            pending: StartupCommands::new(),
            registered: false,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn table(&self) -> &SensorTable<N> {
        &self.table
    }

    /// True once the startup commands were handed to the radio
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Runs the transmit trigger and the inbox loop. Neither ever returns.
    pub async fn run(&mut self) -> ! {
        info!(
            "Aggregator running, {} sensor slots, transmit every {} s",
            N,
            self.config.transmit_period.as_secs()
        );

        let trigger = TransmitTrigger::new(self.config.transmit_period, self.inbox.sender());
        match select(trigger.run(), self.serve()).await {
            Either::First(()) => panic!("Transmit trigger returned"),
            Either::Second(()) => panic!("Aggregator inbox loop returned"),
        }
    }

    /// Waits for a message, handles it along with everything already
    /// queued behind it, then waits again.
    pub async fn serve(&mut self) {
        loop {
            let msg = self.inbox.receive().await;
            self.handle(msg);
            self.drain();
        }
    }

    /// Handles every message already in the inbox without waiting.
    /// Returns the number handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.inbox.try_receive() {
            self.handle(msg);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, msg: TaskMessage) {
        self.post_pending();

        match msg {
            TaskMessage::Report(report) if report.is_begin() => self.begin(),
            TaskMessage::Report(report) => {
                self.state = State::ProcessingData;
                self.process_data(report);
            }
            TaskMessage::Transmit => {
                self.state = State::ProcessingTimer;
                self.process_timer();
            }
        }

        self.state = State::Waiting;
    }

    fn process_data(&mut self, report: SensorReport) {
        if !self.table.save(report.id, &report.reading) {
            debug!("Sensor table full, dropped report from {}", report.id);
        }
    }

    fn process_timer(&mut self) {
        let sequence_number = self.encoder.new_message();
        let fields = self.encoder.append_all_live(&self.table);
        let data = self.encoder.finalize();
        debug!(
            "Payload {} has {} fields, {} digits",
            sequence_number,
            fields,
            data.len()
        );

        let req = RadioRequest::Payload {
            data,
            expect_downlink: self.config.expect_downlink,
        };
        if self.radio.try_send(req).is_err() {
            warn!("Radio queue full, dropped payload {}", sequence_number);
        }
    }

    fn begin(&mut self) {
        if self.registered || !self.pending.is_empty() {
            warn!("Startup already requested, ignoring begin report");
            return;
        }

        for cmd in STARTUP_SEQUENCE.iter() {
            // Capacity is checked at compile time
            self.pending.push(*cmd).ok();
        }
        self.post_pending();
    }

    fn post_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        match self.radio.try_send(RadioRequest::Startup(self.pending.clone())) {
            Ok(()) => {
                info!("Posted {} startup commands", self.pending.len());
                self.pending.clear();
                self.registered = true;
            }
            Err(_) => debug!("Radio queue full, startup commands still pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RadioChannel;
    use crate::sensor::{SensorId, SensorReading};
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::Duration;
    use heapless::Vec;
    use wire_protocols::radio::Command;

    type TestAggregator<'a, const N: usize> = Aggregator<'a, NoopRawMutex, N>;

    fn report(id: u8, value: f32) -> TaskMessage {
        SensorReport::new(SensorId::new(id), SensorReading::from_values(&[value])).into()
    }

    fn payload(radio: &RadioChannel<NoopRawMutex>) -> Option<Vec<u8, MAX_PAYLOAD_LEN>> {
        match radio.try_receive().ok()? {
            RadioRequest::Payload { data, .. } => Some(data),
            RadioRequest::Startup(_) => None,
        }
    }

    fn filler() -> RadioRequest {
        RadioRequest::Payload {
            data: Vec::new(),
            expect_downlink: false,
        }
    }

    #[test]
    fn begin_report_emits_startup_sequence() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        agg.handle(SensorReport::begin().into());

        match radio.try_receive() {
            Ok(RadioRequest::Startup(cmds)) => {
                assert_eq!(cmds.as_slice(), &[Command::Check, Command::DeviceId, Command::Pac])
            }
            other => panic!("unexpected radio request {other:?}"),
        }
        assert!(agg.is_registered());
        assert!(agg.table().is_empty());
        assert_eq!(agg.state(), State::Waiting);
    }

    #[test]
    fn begin_report_is_one_time() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        agg.handle(SensorReport::begin().into());
        agg.handle(SensorReport::begin().into());

        assert!(matches!(radio.try_receive(), Ok(RadioRequest::Startup(_))));
        assert!(radio.try_receive().is_err());
    }

    #[test]
    fn startup_waits_for_radio_queue() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        while radio.try_send(filler()).is_ok() {}
        agg.handle(SensorReport::begin().into());
        assert!(!agg.is_registered());

        // Frees one slot, the next message of any kind retries
        assert!(radio.try_receive().is_ok());
        agg.handle(report(1, 1.0));
        assert!(agg.is_registered());
        assert_eq!(agg.table().len(), 1);

        assert!(matches!(radio.try_receive(), Ok(RadioRequest::Payload { .. })));
        assert!(matches!(radio.try_receive(), Ok(RadioRequest::Startup(_))));
    }

    #[test]
    fn transmit_encodes_live_sensors() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        agg.handle(report(5, 12.3));
        agg.handle(report(7, 45.6));
        agg.handle(report(9, 78.9));
        assert_eq!(agg.state(), State::Waiting);
        agg.handle(TaskMessage::Transmit);

        assert_eq!(payload(&radio).unwrap().as_slice(), b"0000012304560789");
    }

    #[test]
    fn table_overflow_is_dropped() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<2>::new(Default::default(), &inbox, radio.sender());

        agg.handle(report(1, 1.0));
        agg.handle(report(2, 2.0));
        agg.handle(report(3, 3.0));
        agg.handle(TaskMessage::Transmit);

        assert_eq!(payload(&radio).unwrap().as_slice(), b"000000100020");
        assert!(agg.table().recall(SensorId::new(3)).is_none());
    }

    #[test]
    fn full_radio_queue_drops_payload() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let config = AggregatorConfig {
            expect_downlink: true,
            ..Default::default()
        };
        let mut agg = TestAggregator::<3>::new(config, &inbox, radio.sender());

        while radio.try_send(filler()).is_ok() {}
        agg.handle(TaskMessage::Transmit);
        while radio.try_receive().is_ok() {}

        agg.handle(TaskMessage::Transmit);
        match radio.try_receive() {
            Ok(RadioRequest::Payload {
                data,
                expect_downlink,
            }) => {
                // Sequence number 0 went with the dropped payload
                assert_eq!(data.as_slice(), b"0001");
                assert!(expect_downlink);
            }
            other => panic!("unexpected radio request {other:?}"),
        }
    }

    #[test]
    fn drain_handles_in_arrival_order() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        inbox.try_send(report(4, 12.3)).unwrap();
        inbox.try_send(TaskMessage::Transmit).unwrap();
        assert_eq!(agg.drain(), 2);
        assert_eq!(agg.drain(), 0);

        assert_eq!(payload(&radio).unwrap().as_slice(), b"00000123");
    }

    #[test]
    fn serve_handles_queued_messages_before_waiting() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let mut agg = TestAggregator::<3>::new(Default::default(), &inbox, radio.sender());

        inbox.try_send(report(4, 1.5)).unwrap();
        inbox.try_send(TaskMessage::Transmit).unwrap();
        inbox.try_send(report(4, 2.5)).unwrap();

        match block_on(select(agg.serve(), radio.receive())) {
            Either::First(()) => panic!("serve returned"),
            Either::Second(RadioRequest::Payload { data, .. }) => {
                assert_eq!(data.as_slice(), b"00000015")
            }
            Either::Second(other) => panic!("unexpected radio request {other:?}"),
        }
        assert!(inbox.try_receive().is_err());
        assert_eq!(
            agg.table().recall(SensorId::new(4)).and_then(|r| r.primary()),
            Some(2.5)
        );
    }

    #[test]
    fn run_transmits_periodically() {
        let inbox = Inbox::<NoopRawMutex>::new();
        let radio = RadioChannel::<NoopRawMutex>::new();
        let config = AggregatorConfig {
            transmit_period: Duration::from_millis(2),
            ..Default::default()
        };
        let mut agg = TestAggregator::<3>::new(config, &inbox, radio.sender());

        inbox.try_send(report(2, 27.1)).unwrap();
        match block_on(select(agg.run(), radio.receive())) {
            Either::First(_) => unreachable!(),
            Either::Second(RadioRequest::Payload { data, .. }) => {
                assert_eq!(data.as_slice(), b"00000271")
            }
            Either::Second(other) => panic!("unexpected radio request {other:?}"),
        }
    }
}
