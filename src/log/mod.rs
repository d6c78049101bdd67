//! Append Log Module
//!
//! A single append-only text file of sequentially keyed records, searched
//! by bisecting byte offsets rather than through an in-memory index.
//!
//! ## Responsibilities
//! - Allocate dense keys `0, 1, 2, ...` from the last record on disk
//! - Append records, rolling back partially written ones
//! - Locate a record by key with `O(log n)` positioned reads
//!
//! ## File Format
//! ```text
//! ┌──────────┬───┬────────────────────────┬────┐
//! │ Key      │ ␠ │ Base64(Value)          │ \n │   key 0
//! ├──────────┼───┼────────────────────────┼────┤
//! │ Key      │ ␠ │ Base64(Value)          │ \n │   key 1
//! ├──────────┴───┴────────────────────────┴────┤
//! │ ...                                        │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Keys are decimal ASCII with no leading zeros; values use the standard
//! padded base64 alphabet. A file that does not end with `\n` is never
//! produced by this module.

mod file;
mod record;
mod search;
mod store;

pub use file::{LogFile, ReadAt};
pub use record::{
    decode_value, encode_record, parse_key, parse_key_at, read_value, KEY_SEPARATOR,
    MAX_KEY_DIGITS,
};
pub use search::{bisect, delimiter_after, delimiter_before, record_start, Hit, Probe, NEWLINE};
pub use store::AppendLog;
