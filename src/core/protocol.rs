//! Framing for control requests and results on the endpoint socket.
//!
//! Request: `code: u32 LE`, `output_len: u32 LE`.
//! Response: `status: u32 LE`, `information: u32 LE`, then `information` bytes
//! of payload (0 or 4).

use std::io::{Read, Write};

use crate::core::dispatch::{
    ControlRequest, ControlResult, ControlStatus, TEMPERATURE_PAYLOAD_LEN,
};
use crate::error::{CpuTempError, Result};

pub const REQUEST_LEN: usize = 8;
pub const RESPONSE_HEADER_LEN: usize = 8;

pub fn encode_request(request: &ControlRequest) -> [u8; REQUEST_LEN] {
    let mut frame = [0u8; REQUEST_LEN];
    frame[..4].copy_from_slice(&request.code.to_le_bytes());
    frame[4..].copy_from_slice(&request.output_len.to_le_bytes());
    frame
}

pub fn decode_request(frame: &[u8; REQUEST_LEN]) -> ControlRequest {
    let word = |i: usize| u32::from_le_bytes([frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]);
    ControlRequest::new(word(0), word(4))
}

pub fn encode_result(result: &ControlResult) -> Vec<u8> {
    let mut frame = Vec::with_capacity(RESPONSE_HEADER_LEN + TEMPERATURE_PAYLOAD_LEN as usize);
    frame.extend_from_slice(&result.status().code().to_le_bytes());
    frame.extend_from_slice(&result.information().to_le_bytes());
    if let Some(payload) = result.payload() {
        frame.extend_from_slice(payload);
    }
    frame
}

/// Validates a response header and payload into a [`ControlResult`].
pub fn decode_result(header: &[u8; RESPONSE_HEADER_LEN], payload: &[u8]) -> Result<ControlResult> {
    let code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let information = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    let status = ControlStatus::from_code(code)
        .ok_or_else(|| CpuTempError::protocol(format!("unknown status code {:#010x}", code)))?;

    if information as usize != payload.len() {
        return Err(CpuTempError::protocol(format!(
            "header announces {} payload bytes, got {}",
            information,
            payload.len()
        )));
    }

    if status.is_success() {
        let bytes: [u8; 4] = payload.try_into().map_err(|_| {
            CpuTempError::protocol(format!(
                "success with {} payload bytes, expected {}",
                payload.len(),
                TEMPERATURE_PAYLOAD_LEN
            ))
        })?;
        Ok(ControlResult::success(u32::from_le_bytes(bytes)))
    } else if payload.is_empty() {
        ControlResult::failure(status)
            .ok_or_else(|| CpuTempError::protocol("failure status without failure kind"))
    } else {
        Err(CpuTempError::protocol(format!(
            "{} carries {} payload bytes",
            status,
            payload.len()
        )))
    }
}

/// Reads one request frame. `Ok(None)` on a clean end of stream.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Option<ControlRequest>> {
    let mut frame = [0u8; REQUEST_LEN];
    let mut filled = 0;
    while filled < REQUEST_LEN {
        match reader.read(&mut frame[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(CpuTempError::protocol(format!(
                    "truncated request ({} of {} bytes)",
                    filled, REQUEST_LEN
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(decode_request(&frame)))
}

pub fn write_request<W: Write>(writer: &mut W, request: &ControlRequest) -> Result<()> {
    writer.write_all(&encode_request(request))?;
    writer.flush()?;
    Ok(())
}

pub fn read_result<R: Read>(reader: &mut R) -> Result<ControlResult> {
    let mut header = [0u8; RESPONSE_HEADER_LEN];
    reader.read_exact(&mut header)?;

    let information = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if information > TEMPERATURE_PAYLOAD_LEN {
        return Err(CpuTempError::protocol(format!(
            "payload of {} bytes exceeds the {} byte output buffer",
            information, TEMPERATURE_PAYLOAD_LEN
        )));
    }

    let mut payload = vec![0u8; information as usize];
    reader.read_exact(&mut payload)?;
    decode_result(&header, &payload)
}

pub fn write_result<W: Write>(writer: &mut W, result: &ControlResult) -> Result<()> {
    writer.write_all(&encode_result(result))?;
    writer.flush()?;
    Ok(())
}
