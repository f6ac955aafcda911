use crate::opts::{Decode, FieldOpts};
use anyhow::{anyhow, Result};
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use wire_protocols::payload::{self, FieldFormat};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedPayload {
    pub payload: String,
    pub sequence_number: u32,
    /// Field digits as unsigned numbers, in sensor slot order
    pub raw: Vec<u32>,
    /// Field values scaled back to measurements
    pub values: Vec<f32>,
}

pub async fn decode(cmd: Decode) -> Result<()> {
    let format = field_format(&cmd.field)?;
    debug!(scale = format.scale(), width = format.width(), "Decoding");

    if !cmd.payloads.is_empty() {
        for p in cmd.payloads.iter() {
            let decoded = decode_payload(p, format, cmd.signed)?;
            print_payload(&decoded, &cmd)?;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode_payload(line, format, cmd.signed) {
            Ok(decoded) => print_payload(&decoded, &cmd)?,
            Err(e) => warn!("{e}"),
        }
    }

    Ok(())
}

pub fn field_format(opts: &FieldOpts) -> Result<FieldFormat> {
    FieldFormat::new(opts.scale, opts.width).ok_or_else(|| {
        anyhow!(
            "Invalid field format, scale must be non-zero and width in {}..={}",
            FieldFormat::MIN_WIDTH,
            FieldFormat::MAX_WIDTH
        )
    })
}

pub fn decode_payload(payload: &str, format: FieldFormat, signed: bool) -> Result<DecodedPayload> {
    let frame = payload::decode(payload.as_bytes(), format)
        .map_err(|e| anyhow!("Failed to decode payload '{payload}'. {e}"))?;

    let fields = frame.fields();
    let mut raw = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for f in fields {
        raw.push(f.raw());
        values.push(if signed { f.signed_value() } else { f.value() });
    }

    Ok(DecodedPayload {
        payload: payload.to_owned(),
        sequence_number: frame.sequence_number(),
        raw,
        values,
    })
}

fn print_payload(decoded: &DecodedPayload, cmd: &Decode) -> Result<()> {
    if cmd.format.is_text() {
        println!("Payload: {}", decoded.payload);
        println!("  Sequence number: {}", decoded.sequence_number);
        for (slot, (value, raw)) in decoded.values.iter().zip(decoded.raw.iter()).enumerate() {
            println!("  Field {slot}: {value} ({raw})");
        }
    } else {
        println!("{}", serde_json::to_string(decoded)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_three_fields() {
        let d = decode_payload("0000012304560789", FieldFormat::DEFAULT, false).unwrap();
        assert_eq!(d.sequence_number, 0);
        assert_eq!(d.raw, vec![123, 456, 789]);
        assert!((d.values[1] - 45.6).abs() < 1e-4);
    }

    #[test]
    fn signed_fields() {
        let d = decode_payload("00429995", FieldFormat::DEFAULT, true).unwrap();
        assert_eq!(d.sequence_number, 42);
        assert!((d.values[0] + 0.5).abs() < 1e-6);

        let d = decode_payload("00429995", FieldFormat::DEFAULT, false).unwrap();
        assert!((d.values[0] - 999.5).abs() < 1e-3);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(decode_payload("12ab", FieldFormat::DEFAULT, false).is_err());
        assert!(decode_payload("", FieldFormat::DEFAULT, false).is_err());
        assert!(field_format(&FieldOpts { scale: 0, width: 4 }).is_err());
        assert!(field_format(&FieldOpts { scale: 10, width: 12 }).is_err());
    }

    #[test]
    fn json_shape() {
        let d = decode_payload("00070271", FieldFormat::DEFAULT, false).unwrap();
        let v: serde_json::Value = serde_json::to_value(&d).unwrap();
        assert_eq!(v["sequence_number"], 7);
        assert_eq!(v["raw"][0], 271);
    }
}
