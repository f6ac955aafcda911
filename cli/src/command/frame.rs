use crate::opts::Frame;
use anyhow::{bail, Result};
use wire_protocols::{radio::Command, MAX_PAYLOAD_LEN};

pub fn frame(cmd: Frame) -> Result<()> {
    let line = frame_line(&cmd.payload, cmd.downlink)?;
    println!("{line}");
    Ok(())
}

/// The send frame command the node would write to the radio for `payload`
pub fn frame_line(payload: &str, downlink: bool) -> Result<String> {
    let payload = payload.trim();
    if payload.is_empty() || !payload.bytes().all(|b| b.is_ascii_digit()) {
        bail!("Payload '{payload}' must be a non-empty string of digits");
    }
    if payload.len() % 2 != 0 {
        bail!("Payload '{payload}' has an odd number of digits");
    }
    if payload.len() > MAX_PAYLOAD_LEN {
        bail!("Payload is longer than {MAX_PAYLOAD_LEN} digits");
    }

    Ok(Command::SendFrame {
        payload: payload.as_bytes(),
        downlink,
    }
    .to_string())
}
