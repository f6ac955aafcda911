//! Staging buffer for the outbound payload.
//!
//! See [`wire_protocols::payload`] for the format.
//! Every write checks the remaining capacity first; a field that doesn't
//! fit is skipped and the bytes already written stay as they are.

use crate::config::MAX_PAYLOAD_LEN;
use crate::table::SensorTable;
use heapless::Vec;
use wire_protocols::payload::{FieldFormat, PADDING};

/// A finalized payload, ASCII digits
pub type Payload<const MAX: usize = MAX_PAYLOAD_LEN> = Vec<u8, MAX>;

#[derive(Debug)]
pub struct PayloadEncoder<const MAX: usize = MAX_PAYLOAD_LEN> {
    buf: Vec<u8, MAX>,
    format: FieldFormat,
    sequence_number: u32,
}

impl<const MAX: usize> PayloadEncoder<MAX> {
    const EVEN_CAPACITY: () = assert!(MAX % 2 == 0, "payload capacity must be even");

    pub const fn new(format: FieldFormat) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::EVEN_CAPACITY;
        Self {
            buf: Vec::new(),
            format,
            sequence_number: 0,
        }
    }

    pub fn format(&self) -> FieldFormat {
        self.format
    }

    /// Sequence number the next message will carry
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Clears the buffer and writes the sequence number field.
    /// Returns the sequence number used. The counter wraps at the field
    /// range so consecutive messages always differ by one.
    pub fn new_message(&mut self) -> u32 {
        self.buf.clear();
        let sequence_number = self.sequence_number;
        self.sequence_number = (sequence_number + 1) % self.format.modulus();
        self.append_integer(i64::from(sequence_number));
        sequence_number
    }

    /// Appends a measurement as a scaled fixed-width field.
    /// Returns false if the field didn't fit.
    pub fn append_value(&mut self, value: f32) -> bool {
        self.append_integer(i64::from(self.format.to_fixed(value)))
    }

    /// Appends the primary value of every allocated table slot, in slot
    /// order. A slot without values contributes a zero field.
    /// Returns the number of fields written.
    pub fn append_all_live<const N: usize>(&mut self, table: &SensorTable<N>) -> usize {
        let mut written = 0;
        for (id, reading) in table.iter() {
            if self.append_value(reading.primary().unwrap_or(0.0)) {
                written += 1;
            } else {
                trace!("Payload full, skipped sensor {}", id);
            }
        }
        written
    }

    /// Pads the buffer to an even length and returns its contents.
    pub fn finalize(&mut self) -> Payload<MAX> {
        if self.buf.len() % 2 != 0 {
            // Capacity is even, an odd length always leaves room
            self.buf.push(PADDING).ok();
        }
        self.buf.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn append_integer(&mut self, value: i64) -> bool {
        let mut field = [0_u8; FieldFormat::MAX_WIDTH as usize];
        match self.format.encode_field(value, &mut field) {
            Some(len) => self.buf.extend_from_slice(&field[..len]).is_ok(),
            None => false,
        }
    }
}

impl<const MAX: usize> Default for PayloadEncoder<MAX> {
    fn default() -> Self {
        Self::new(FieldFormat::DEFAULT)
    }
}
