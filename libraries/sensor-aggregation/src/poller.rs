//! One poller per sensor.
//!
//! A poller waits according to the sensor's schedule, polls it while
//! holding the shared bus and posts anything it produced to the aggregator.

use crate::bus::BusArbiter;
use crate::config::MAX_SENSOR_DATA_SIZE;
use crate::message::{InboxSender, SensorReport};
use crate::sensor::{PollSchedule, Sensor, SensorInfo, SensorReading};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embassy_time::{with_timeout, Duration, Ticker, Timer};

/// Signalled by an interrupt handler when an event driven sensor has data
pub type SensorEvent<M> = Signal<M, ()>;

pub struct SensorPoller<'a, M: RawMutex, B, S> {
    info: SensorInfo,
    sensor: S,
    bus: &'a BusArbiter<M, B>,
    inbox: InboxSender<'a, M>,
    event: Option<&'a SensorEvent<M>>,
}

impl<'a, M: RawMutex, B, S: Sensor<B>> SensorPoller<'a, M, B, S> {
    pub fn new(
        info: SensorInfo,
        sensor: S,
        bus: &'a BusArbiter<M, B>,
        inbox: InboxSender<'a, M>,
    ) -> Self {
        Self {
            info,
            sensor,
            bus,
            inbox,
            event: None,
        }
    }

    /// Wakes an `OnEvent` poller early when `event` is signalled.
    /// Without one the poller just polls every timeout.
    pub fn with_event(mut self, event: &'a SensorEvent<M>) -> Self {
        self.event = Some(event);
        self
    }

    pub fn info(&self) -> &SensorInfo {
        &self.info
    }

    /// Runs the sensor's init under the bus lock.
    pub async fn init(&mut self) -> Result<(), S::Error> {
        let mut bus = self.bus.acquire().await;
        self.sensor.init(&mut *bus).await
    }

    /// Polls the sensor once and posts a report if it produced values.
    /// Returns the number of values posted.
    pub async fn poll_once(&mut self) -> usize {
        let mut values = [0.0_f32; MAX_SENSOR_DATA_SIZE];

        let count = {
            let mut bus = self.bus.acquire().await;
            match self.sensor.poll(&mut *bus, &mut values).await {
                Ok(count) => count.min(MAX_SENSOR_DATA_SIZE),
                Err(_) => {
                    warn!("Sensor {} ({}) poll failed", self.info.name, self.info.id);
                    0
                }
            }
            // Bus released here, before we block on the inbox
        };

        if count != 0 {
            let reading = SensorReading::from_values(&values[..count]);
            trace!("Sensor {} produced {} values", self.info.name, count);
            self.inbox
                .send(SensorReport::new(self.info.id, reading).into())
                .await;
        }

        count
    }

    pub async fn run(mut self) -> ! {
        if self.init().await.is_err() {
            error!("Sensor {} ({}) init failed", self.info.name, self.info.id);
        }
        debug!("Polling sensor {} ({})", self.info.name, self.info.id);

        match self.info.schedule {
            PollSchedule::Every(period) => {
                let mut ticker = Ticker::every(period);
                loop {
                    ticker.next().await;
                    self.poll_once().await;
                }
            }
            PollSchedule::OnEvent { timeout } => loop {
                self.wait_for_event(timeout).await;
                self.poll_once().await;
            },
        }
    }

    async fn wait_for_event(&self, timeout: Duration) {
        match self.event {
            Some(event) => {
                if with_timeout(timeout, event.wait()).await.is_err() {
                    trace!("Sensor {} event timed out", self.info.name);
                }
            }
            None => Timer::after(timeout).await,
        }
    }
}
