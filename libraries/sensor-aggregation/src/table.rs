//! Latest reading of every sensor seen so far.
//!
//! The table is a fixed array of slots searched linearly.
//! A slot is allocated the first time an identity is saved, in the first
//! empty position, and then updated in place for the rest of the program.
//! Slots are never freed, so once allocated an identity keeps its position
//! in the payload and can't be evicted by a newcomer.

use crate::config::MAX_SENSOR_COUNT;
use crate::sensor::{SensorId, SensorReading};

#[derive(Copy, Clone, Debug)]
struct Slot {
    id: SensorId,
    reading: SensorReading,
}

impl Slot {
    const EMPTY: Self = Slot {
        id: SensorId::NONE,
        reading: SensorReading::new(),
    };
}

#[derive(Debug)]
pub struct SensorTable<const N: usize = MAX_SENSOR_COUNT> {
    slots: [Slot; N],
}

impl<const N: usize> SensorTable<N> {
    pub const fn new() -> Self {
        Self {
            slots: [Slot::EMPTY; N],
        }
    }

    /// Empties every slot
    pub fn reset(&mut self) {
        self.slots.fill(Slot::EMPTY);
    }

    /// Stores `reading` as the latest for `id`.
    ///
    /// Returns false, leaving the table untouched, when `id` is new and
    /// there is no empty slot left, or when `id` is the empty sentinel.
    pub fn save(&mut self, id: SensorId, reading: &SensorReading) -> bool {
        match self.slot_for(id) {
            Some(slot) => {
                slot.reading.set(reading.values());
                true
            }
            None => false,
        }
    }

    /// Latest reading for `id`, if it was ever saved
    pub fn recall(&self, id: SensorId) -> Option<&SensorReading> {
        if id.is_none() {
            return None;
        }
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.reading)
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SensorId, &SensorReading)> + '_ {
        self.slots
            .iter()
            .filter(|slot| !slot.id.is_none())
            .map(|slot| (slot.id, &slot.reading))
    }

    /// Number of allocated slots
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Finds the slot of `id`, allocating the first empty one for a new id.
    fn slot_for(&mut self, id: SensorId) -> Option<&mut Slot> {
        if id.is_none() {
            return None;
        }

        let mut empty = None;
        let mut found = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.id == id {
                found = Some(i);
                break;
            }
            if empty.is_none() && slot.id.is_none() {
                empty = Some(i);
            }
        }

        let index = match (found, empty) {
            (Some(i), _) => i,
            (None, Some(i)) => {
                let slot = &mut self.slots[i];
                slot.id = id;
                slot.reading.clear();
                i
            }
            (None, None) => return None,
        };
        Some(&mut self.slots[index])
    }
}

impl<const N: usize> Default for SensorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
