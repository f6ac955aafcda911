use crate::config::{DEFAULT_EVENT_TIMEOUT_SEC, MAX_SENSOR_DATA_SIZE};
use core::fmt;
use embassy_time::Duration;

/// Identity of a registered sensor.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId(u8);

impl SensorId {
    /// Reserved identity of the startup report that starts the network
    /// registration instead of carrying a measurement
    pub const BEGIN: Self = SensorId(0);

    /// Marks an unallocated table slot
    pub const NONE: Self = SensorId(0xFF);

    const FIRST: Self = SensorId(1);

    pub const fn new(raw: u8) -> Self {
        SensorId(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    pub const fn is_begin(self) -> bool {
        self.0 == Self::BEGIN.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out sensor identities at registration, starting at 1.
/// The reserved identities are never handed out.
#[derive(Debug)]
pub struct SensorIds {
    next: u8,
}

impl SensorIds {
    pub const fn new() -> Self {
        Self {
            next: SensorId::FIRST.0,
        }
    }

    /// Returns `None` once every identity below the sentinel is taken
    pub fn allocate(&mut self) -> Option<SensorId> {
        if self.next == SensorId::NONE.0 {
            None
        } else {
            let id = SensorId(self.next);
            self.next += 1;
            Some(id)
        }
    }
}

impl Default for SensorIds {
    fn default() -> Self {
        Self::new()
    }
}

/// The values produced by one poll of a sensor.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    values: [f32; MAX_SENSOR_DATA_SIZE],
    count: u8,
}

impl SensorReading {
    pub const fn new() -> Self {
        Self {
            values: [0.0; MAX_SENSOR_DATA_SIZE],
            count: 0,
        }
    }

    /// Values beyond `MAX_SENSOR_DATA_SIZE` are dropped.
    pub fn from_values(values: &[f32]) -> Self {
        let mut reading = Self::new();
        reading.set(values);
        reading
    }

    /// Overwrites the reading, returns the number of values kept.
    pub fn set(&mut self, values: &[f32]) -> usize {
        let count = copy_values(values, &mut self.values);
        self.count = count as u8;
        count
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn values(&self) -> &[f32] {
        &self.values[..usize::from(self.count)]
    }

    pub fn count(&self) -> usize {
        usize::from(self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The first value, the one that goes into the payload
    pub fn primary(&self) -> Option<f32> {
        self.values().first().copied()
    }
}

impl PartialEq for SensorReading {
    fn eq(&self, other: &Self) -> bool {
        self.values() == other.values()
    }
}

/// Copies as many values as fit, returns the number copied.
pub fn copy_values(src: &[f32], dst: &mut [f32]) -> usize {
    let count = src.len().min(dst.len());
    dst[..count].copy_from_slice(&src[..count]);
    count
}

/// When a poller wakes up to poll its sensor.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollSchedule {
    /// Poll at a fixed rate
    Every(Duration),
    /// Poll when the sensor's event is signalled, or after `timeout`
    OnEvent { timeout: Duration },
}

impl PollSchedule {
    /// A zero interval means the sensor is event driven.
    pub const fn from_interval_ms(interval_ms: u64) -> Self {
        if interval_ms == 0 {
            PollSchedule::OnEvent {
                timeout: Duration::from_secs(DEFAULT_EVENT_TIMEOUT_SEC),
            }
        } else {
            PollSchedule::Every(Duration::from_millis(interval_ms))
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorInfo {
    pub id: SensorId,
    /// Short name, e.g. "tmp"
    pub name: &'static str,
    pub schedule: PollSchedule,
}

impl SensorInfo {
    pub fn register(
        ids: &mut SensorIds,
        name: &'static str,
        schedule: PollSchedule,
    ) -> Option<Self> {
        let id = ids.allocate()?;
        Some(Self { id, name, schedule })
    }
}

/// A sensor sitting on a shared bus of type `B`.
///
/// Both methods are only called while the poller holds the bus.
#[allow(async_fn_in_trait)]
pub trait Sensor<B> {
    type Error;

    /// Called once before the first poll
    async fn init(&mut self, _bus: &mut B) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Fills `values` with new measurements and returns how many were
    /// written. Zero means there is no new data.
    async fn poll(&mut self, bus: &mut B, values: &mut [f32]) -> Result<usize, Self::Error>;
}
