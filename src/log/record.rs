//! Record framing
//!
//! One record per line: `<key> <base64(value)>\n`. The key is decimal with
//! no superfluous leading zeros; the value uses the standard padded base64
//! alphabet, which never produces a newline.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Result, SeqLogError};

use super::file::ReadAt;
use super::search::{self, Probe, NEWLINE};

/// Separates the key field from the value field
pub const KEY_SEPARATOR: u8 = b' ';

/// Digits in `u64::MAX`
pub const MAX_KEY_DIGITS: usize = 20;

/// Format a complete record line, including the trailing newline
pub fn encode_record(key: u64, value: &[u8]) -> Vec<u8> {
    let payload = STANDARD.encode(value);
    let key = key.to_string();

    let mut line = Vec::with_capacity(key.len() + payload.len() + 2);
    line.extend_from_slice(key.as_bytes());
    line.push(KEY_SEPARATOR);
    line.extend_from_slice(payload.as_bytes());
    line.push(NEWLINE);
    line
}

/// Parse a key field. `None` unless it is canonical decimal that fits a u64.
pub fn parse_key(field: &[u8]) -> Option<u64> {
    match field {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        _ if field.iter().all(u8::is_ascii_digit) => std::str::from_utf8(field).ok()?.parse().ok(),
        _ => None,
    }
}

/// Read the key of the record starting at `offset`.
///
/// The key field ends at the first space; no bytes at or past `limit` are
/// read. The returned probe's `payload` is the offset just past that space.
pub fn parse_key_at<S>(source: &S, offset: u64, limit: u64) -> Result<Probe<u64>>
where
    S: ReadAt + ?Sized,
{
    let available = limit.saturating_sub(offset).min(MAX_KEY_DIGITS as u64 + 1) as usize;
    let mut buf = [0u8; MAX_KEY_DIGITS + 1];
    source.read_exact_at(&mut buf[..available], offset)?;
    let field = &buf[..available];

    let sep = match field.iter().position(|&b| b == KEY_SEPARATOR) {
        Some(sep) => sep,
        None if available <= MAX_KEY_DIGITS => {
            return Err(SeqLogError::malformed(offset, "key field runs past end of log"))
        }
        None => return Err(SeqLogError::malformed(offset, "key field is too long")),
    };

    let key = parse_key(&field[..sep]).ok_or_else(|| {
        SeqLogError::malformed(
            offset,
            format!("invalid key {:?}", String::from_utf8_lossy(&field[..sep])),
        )
    })?;

    Ok(Probe {
        key,
        payload: offset + sep as u64 + 1,
    })
}

/// Read the value field that begins at `payload`, up to (not including) the
/// record's newline. Returns the raw base64 bytes.
pub fn read_value<S>(source: &S, payload: u64, limit: u64, chunk_size: usize) -> Result<Vec<u8>>
where
    S: ReadAt + ?Sized,
{
    let end = search::delimiter_after(source, payload, limit, NEWLINE, chunk_size)?
        .ok_or_else(|| SeqLogError::malformed(payload, "value field is not newline-terminated"))?;

    let mut field = vec![0u8; (end - payload) as usize];
    source.read_exact_at(&mut field, payload)?;
    Ok(field)
}

/// Decode a base64 value field
pub fn decode_value(field: &[u8]) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(field)?)
}
