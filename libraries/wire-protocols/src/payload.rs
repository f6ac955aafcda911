//! The payload protocol covers the uplink frame sent through the radio.
//!
//! A payload is a run of fixed-width decimal numerals with no separators.
//! The first field is the running sequence number, every following field is
//! the scaled primary value of one sensor, in the order the sensors were
//! first seen by the aggregator.
//! The total length is padded with a trailing `'0'` to an even number of
//! digits so the frame can be handed to the radio as hex bytes.

use core::fmt;

/// Default payload capacity in digits: one 12 byte Sigfox frame,
/// two digits per byte.
pub const MAX_PAYLOAD_LEN: usize = 12 * 2;

/// Digit appended when a payload has an odd length
pub const PADDING: u8 = b'0';

/// Scale and width of a single numeral field.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldFormat {
    scale: u16,
    width: u8,
}

impl FieldFormat {
    /// A single digit field can't be told apart from the padding digit.
    pub const MIN_WIDTH: u8 = 2;
    /// Largest width whose modulus fits a `u32`
    pub const MAX_WIDTH: u8 = 9;

    /// One decimal place in four digits, so 27.1 becomes "0271".
    pub const DEFAULT: Self = Self {
        scale: 10,
        width: 4,
    };

    pub const fn new(scale: u16, width: u8) -> Option<Self> {
        if scale == 0 || width < Self::MIN_WIDTH || width > Self::MAX_WIDTH {
            None
        } else {
            Some(Self { scale, width })
        }
    }

    pub const fn scale(&self) -> u16 {
        self.scale
    }

    /// Number of digits in one field
    pub const fn width(&self) -> usize {
        self.width as usize
    }

    /// Number of distinct values a field can hold, 10^width.
    pub const fn modulus(&self) -> u32 {
        10_u32.pow(self.width as u32)
    }

    /// Converts a measurement to fixed point.
    /// The multiplication is done in `f32` and the result is truncated
    /// toward zero, NaN maps to 0.
    pub fn to_fixed(&self, value: f32) -> i32 {
        (value * f32::from(self.scale)) as i32
    }

    /// Converts a fixed point value back to a measurement.
    pub fn from_fixed(&self, value: i32) -> f32 {
        value as f32 / f32::from(self.scale)
    }

    /// Maps any integer into the field range.
    /// Out of range values keep their low-order digits, negative values
    /// end up in ten's complement.
    pub fn wrap(&self, value: i64) -> u32 {
        value.rem_euclid(i64::from(self.modulus())) as u32
    }

    /// Interprets a field as a ten's complement number.
    pub fn to_signed(&self, raw: u32) -> i32 {
        let modulus = self.modulus();
        if raw >= modulus / 2 {
            (i64::from(raw) - i64::from(modulus)) as i32
        } else {
            raw as i32
        }
    }

    /// Writes `value` as `width` ASCII digits at the start of `out`.
    /// Returns the number of bytes written, or `None` without touching
    /// `out` when it is too short.
    pub fn encode_field(&self, value: i64, out: &mut [u8]) -> Option<usize> {
        let width = self.width();
        let field = out.get_mut(..width)?;
        let mut v = self.wrap(value);
        for digit in field.iter_mut().rev() {
            *digit = b'0' + (v % 10) as u8;
            v /= 10;
        }
        Some(width)
    }

    fn decode_field(&self, digits: &[u8]) -> u32 {
        digits
            .iter()
            .fold(0_u32, |acc, d| acc * 10 + u32::from(d - b'0'))
    }
}

impl Default for FieldFormat {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No bytes at all
    Empty,
    /// Byte at the given offset is not an ASCII digit
    NotDigits(usize),
    /// Shorter than the sequence number field
    TooShort,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => f.write_str("empty payload"),
            DecodeError::NotDigits(at) => write!(f, "non-digit byte at offset {at}"),
            DecodeError::TooShort => f.write_str("payload shorter than one field"),
        }
    }
}

/// Shorthand for [`Frame::parse`]
pub fn decode(bytes: &[u8], format: FieldFormat) -> Result<Frame<'_>, DecodeError> {
    Frame::parse(bytes, format)
}

/// A received payload, checked to be all digits.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Frame<'a> {
    format: FieldFormat,
    sequence_number: u32,
    fields: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn parse(bytes: &'a [u8], format: FieldFormat) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if let Some(at) = bytes.iter().position(|b| !b.is_ascii_digit()) {
            return Err(DecodeError::NotDigits(at));
        }
        if bytes.len() < format.width() {
            return Err(DecodeError::TooShort);
        }
        let (seq, fields) = bytes.split_at(format.width());
        Ok(Self {
            format,
            sequence_number: format.decode_field(seq),
            fields,
        })
    }

    pub fn format(&self) -> FieldFormat {
        self.format
    }

    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Number of complete sensor fields, the padding digit is not counted.
    pub fn field_count(&self) -> usize {
        self.fields.len() / self.format.width()
    }

    pub fn fields(&self) -> Fields<'a> {
        Fields {
            format: self.format,
            chunks: self.fields.chunks_exact(self.format.width()),
        }
    }
}

/// Iterator over the sensor fields of a [`Frame`], in slot order.
#[derive(Clone, Debug)]
pub struct Fields<'a> {
    format: FieldFormat,
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl Iterator for Fields<'_> {
    type Item = Field;

    fn next(&mut self) -> Option<Self::Item> {
        let digits = self.chunks.next()?;
        Some(Field {
            format: self.format,
            raw: self.format.decode_field(digits),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Fields<'_> {}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    format: FieldFormat,
    raw: u32,
}

impl Field {
    /// The digits as an unsigned number
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// The digits as a ten's complement number
    pub fn signed(&self) -> i32 {
        self.format.to_signed(self.raw)
    }

    /// Measurement assuming the sensor never reports negative values
    pub fn value(&self) -> f32 {
        self.format.from_fixed(self.raw as i32)
    }

    /// Measurement assuming the field may be negative
    pub fn signed_value(&self) -> f32 {
        self.format.from_fixed(self.signed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_format_bounds() {
        assert_eq!(FieldFormat::new(10, 4), Some(FieldFormat::DEFAULT));
        assert!(FieldFormat::new(0, 4).is_none());
        assert!(FieldFormat::new(10, 1).is_none());
        assert!(FieldFormat::new(10, 10).is_none());
        assert_eq!(FieldFormat::new(1, 9).unwrap().modulus(), 1_000_000_000);
    }

    #[test]
    fn to_fixed_truncates_toward_zero() {
        let f = FieldFormat::DEFAULT;
        assert_eq!(f.to_fixed(27.19), 271);
        assert_eq!(f.to_fixed(12.3), 123);
        assert_eq!(f.to_fixed(45.6), 456);
        assert_eq!(f.to_fixed(78.9), 789);
        assert_eq!(f.to_fixed(-3.99), -39);
        assert_eq!(f.to_fixed(f32::NAN), 0);
    }

    #[test]
    fn encode_field_keeps_low_digits() {
        let f = FieldFormat::DEFAULT;
        let mut buf = [0_u8; 4];

        assert_eq!(f.encode_field(271, &mut buf), Some(4));
        assert_eq!(&buf, b"0271");

        assert_eq!(f.encode_field(123_456, &mut buf), Some(4));
        assert_eq!(&buf, b"3456");

        assert_eq!(f.encode_field(-5, &mut buf), Some(4));
        assert_eq!(&buf, b"9995");
        assert_eq!(f.to_signed(9995), -5);
    }

    #[test]
    fn encode_field_short_buffer_is_untouched() {
        let mut buf = *b"xyz";
        assert_eq!(FieldFormat::DEFAULT.encode_field(1, &mut buf), None);
        assert_eq!(&buf, b"xyz");
    }

    #[test]
    fn parse_frame() {
        let frame = Frame::parse(b"0000012304560789", FieldFormat::DEFAULT).unwrap();
        assert_eq!(frame.sequence_number(), 0);
        assert_eq!(frame.field_count(), 3);

        let raws: [u32; 3] = {
            let mut it = frame.fields().map(|f| f.raw());
            [it.next().unwrap(), it.next().unwrap(), it.next().unwrap()]
        };
        assert_eq!(raws, [123, 456, 789]);

        let first = frame.fields().next().unwrap();
        assert!((first.value() - 12.3).abs() < 1e-4);
    }

    #[test]
    fn parse_frame_ignores_padding() {
        let format = FieldFormat::new(10, 3).unwrap();
        let frame = Frame::parse(b"0071234560", format).unwrap();
        assert_eq!(frame.sequence_number(), 7);
        assert_eq!(frame.field_count(), 2);
        assert_eq!(frame.fields().last().map(|f| f.raw()), Some(456));
    }

    #[test]
    fn parse_frame_errors() {
        let f = FieldFormat::DEFAULT;
        assert_eq!(Frame::parse(b"", f), Err(DecodeError::Empty));
        assert_eq!(Frame::parse(b"00a1", f), Err(DecodeError::NotDigits(2)));
        assert_eq!(Frame::parse(b"00", f), Err(DecodeError::TooShort));
    }

    #[test]
    fn negative_field() {
        let frame = Frame::parse(b"00129995", FieldFormat::DEFAULT).unwrap();
        let field = frame.fields().next().unwrap();
        assert_eq!(field.raw(), 9995);
        assert_eq!(field.signed(), -5);
        assert!((field.signed_value() + 0.5).abs() < 1e-6);
    }
}
