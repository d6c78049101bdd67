//! Offset search over delimited records
//!
//! Binary search over a sorted stream of variable-length records, using
//! byte offsets as a stand-in for record positions. Record boundaries are
//! discovered on demand by scanning for the delimiter, so nothing about the
//! layout needs to be held in memory.
//!
//! These helpers know nothing about what a record contains; the caller
//! supplies how to read a key at a record start.

use std::cmp::Ordering;
use std::io;

use crate::error::{Result, SeqLogError};

use super::file::ReadAt;

/// Record delimiter
pub const NEWLINE: u8 = b'\n';

/// Offset of the nearest `delim` strictly before `idx`.
///
/// Scans backward in windows of at most `chunk_size` bytes, each window
/// ending where the previous one began. Returns `None` when the start of
/// the source is reached without finding one, i.e. `idx` lies inside the
/// first record.
pub fn delimiter_before<S>(source: &S, idx: u64, delim: u8, chunk_size: usize) -> io::Result<Option<u64>>
where
    S: ReadAt + ?Sized,
{
    let chunk_size = chunk_size.max(1) as u64;
    let mut buf = vec![0u8; chunk_size.min(idx) as usize];
    let mut end = idx;

    while end > 0 {
        let len = chunk_size.min(end);
        let start = end - len;
        let window = &mut buf[..len as usize];
        source.read_exact_at(window, start)?;

        if let Some(pos) = window.iter().rposition(|&b| b == delim) {
            return Ok(Some(start + pos as u64));
        }
        end = start;
    }

    Ok(None)
}

/// Offset of the first `delim` in `[from, limit)`, scanning forward in
/// windows of at most `chunk_size` bytes.
pub fn delimiter_after<S>(
    source: &S,
    from: u64,
    limit: u64,
    delim: u8,
    chunk_size: usize,
) -> io::Result<Option<u64>>
where
    S: ReadAt + ?Sized,
{
    let chunk_size = chunk_size.max(1) as u64;
    let mut buf = vec![0u8; chunk_size.min(limit.saturating_sub(from)) as usize];
    let mut pos = from;

    while pos < limit {
        let len = chunk_size.min(limit - pos);
        let window = &mut buf[..len as usize];
        source.read_exact_at(window, pos)?;

        if let Some(i) = window.iter().position(|&b| b == delim) {
            return Ok(Some(pos + i as u64));
        }
        pos += len;
    }

    Ok(None)
}

/// Start of the record containing `idx`
pub fn record_start<S>(source: &S, idx: u64, chunk_size: usize) -> io::Result<u64>
where
    S: ReadAt + ?Sized,
{
    Ok(delimiter_before(source, idx, NEWLINE, chunk_size)?.map_or(0, |nl| nl + 1))
}

/// A key read at a record start, plus where the rest of the record begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe<K> {
    pub key: K,
    /// Offset of the first byte after the key field
    pub payload: u64,
}

/// Location of the record whose key matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Offset of the record's first byte
    pub start: u64,
    /// Offset of the first byte after the key field
    pub payload: u64,
}

/// Bisect the newline-delimited records in `source[..len]` for `target`.
///
/// Records must be sorted by key and `len` must end on a record boundary.
/// The live interval `[min, max)` always starts at a record start and ends
/// at a record's terminating newline; every probe removes the probed record
/// from it, so the loop runs at most once per record and in practice
/// `O(log n)` times.
pub fn bisect<S, K, F>(
    source: &S,
    len: u64,
    target: &K,
    chunk_size: usize,
    mut key_at: F,
) -> Result<Option<Hit>>
where
    S: ReadAt + ?Sized,
    K: Ord,
    F: FnMut(&S, u64) -> Result<Probe<K>>,
{
    if len == 0 {
        return Ok(None);
    }

    // The trailing newline of the last record is excluded so `max` starts
    // inside that record rather than past it.
    let mut min = 0u64;
    let mut max = len - 1;

    while min < max {
        let idx = min + (max - min) / 2;
        let start = record_start(source, idx, chunk_size)?;
        let probe = key_at(source, start)?;

        match probe.key.cmp(target) {
            Ordering::Equal => {
                tracing::trace!(start, "bisect hit");
                return Ok(Some(Hit {
                    start,
                    payload: probe.payload,
                }));
            }
            Ordering::Less => {
                let end = delimiter_after(source, probe.payload, len, NEWLINE, chunk_size)?
                    .ok_or_else(|| {
                        SeqLogError::malformed(start, "record is not newline-terminated")
                    })?;
                tracing::trace!(idx, start, end, "probe below target");
                min = end + 1;
            }
            Ordering::Greater => {
                tracing::trace!(idx, start, "probe above target");
                max = start.saturating_sub(1);
            }
        }
    }

    Ok(None)
}
