//! Append Log
//!
//! The store itself: one growable file of sequentially keyed records.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::config::{Config, SyncStrategy};
use crate::error::{Result, SeqLogError};

use super::file::{LogFile, ReadAt};
use super::record;
use super::search::{self, NEWLINE};

/// An append-only log of base64-framed records keyed `0, 1, 2, ...`
///
/// ## Concurrency Model: Serialized Writers / Concurrent Readers
///
/// - **Inserts**: serialized by `writer`. The lock covers the whole
///   derive-key / write / sync / rollback sequence.
/// - **Gets**: take no lock. Every read is positioned, and a get only looks
///   at bytes below the committed length it loaded when it started.
/// - `committed` is advanced only after a record is completely written, so
///   readers never observe a partial or rolled-back record.
pub struct AppendLog<F: LogFile = File> {
    /// Log configuration
    config: Config,

    /// Backing file, read and written only through explicit offsets
    file: F,

    /// Length of the log up to the end of the last complete record
    committed: AtomicU64,

    /// Serializes inserts
    writer: Mutex<WriterState>,
}

/// State owned by whoever holds the writer lock
struct WriterState {
    /// Inserts written since the last explicit sync
    unsynced: usize,
}

impl AppendLog<File> {
    /// Open the log at `path`, creating an empty one if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().log_path(path.as_ref()).build();
        Self::open_with(config)
    }

    /// Open the log described by `config`
    pub fn open_with(config: Config) -> Result<Self> {
        config.validate()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .open(&config.log_path)?;

        Self::with_file(file, config)
    }
}

impl<F: LogFile> AppendLog<F> {
    /// Wrap an already opened backing file. Its current contents are
    /// trusted to be a valid log.
    pub fn with_file(file: F, config: Config) -> Result<Self> {
        config.validate()?;
        let len = file.size()?;

        tracing::debug!(path = %config.log_path.display(), len, "opened append log");

        Ok(Self {
            config,
            file,
            committed: AtomicU64::new(len),
            writer: Mutex::new(WriterState { unsynced: 0 }),
        })
    }

    /// Append `value` as a new record and return its key.
    ///
    /// If the append fails part way, the file is truncated back to its
    /// previous length before the error is returned; the key is not
    /// consumed and the next insert will allocate it again.
    pub fn insert(&self, value: &[u8]) -> Result<u64> {
        let mut writer = self.writer.lock();

        let end = self.committed.load(Ordering::Acquire);
        let key = self.next_key(end)?;
        let line = record::encode_record(key, value);

        if let Err(err) = self.append(&mut writer, &line, end) {
            tracing::warn!(key, offset = end, error = %err, "append failed, rolling back");
            return match self.file.truncate(end) {
                Ok(()) => Err(err.into()),
                Err(truncate) => Err(SeqLogError::Rollback {
                    write: err,
                    truncate,
                }),
            };
        }

        self.committed
            .store(end + line.len() as u64, Ordering::Release);
        tracing::debug!(key, offset = end, bytes = line.len(), "record appended");

        Ok(key)
    }

    /// Look up the value stored under `key`.
    ///
    /// Returns `Ok(None)` when no such key has been inserted.
    pub fn get(&self, key: u64) -> Result<Option<Vec<u8>>> {
        let len = self.committed.load(Ordering::Acquire);
        let chunk_size = self.config.scan_chunk_size;

        let hit = search::bisect(&self.file, len, &key, chunk_size, |file, start| {
            record::parse_key_at(file, start, len)
        })?;

        match hit {
            Some(hit) => {
                let field = record::read_value(&self.file, hit.payload, len, chunk_size)?;
                Ok(Some(record::decode_value(&field)?))
            }
            None => Ok(None),
        }
    }

    /// Flush all appended records to durable storage
    pub fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        self.file.sync_data()?;
        writer.unsynced = 0;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.config.log_path
    }

    /// Committed length of the log in bytes
    pub fn len(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    /// True when the log holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Key that follows the last record ending at `end`
    fn next_key(&self, end: u64) -> Result<u64> {
        if end == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        self.file.read_exact_at(&mut last, end - 1)?;
        if last[0] != NEWLINE {
            return Err(SeqLogError::malformed(
                end - 1,
                "log does not end with a complete record",
            ));
        }

        // end - 1 skips the last record's own newline
        let start = search::record_start(&self.file, end - 1, self.config.scan_chunk_size)?;
        let probe = record::parse_key_at(&self.file, start, end)?;

        probe
            .key
            .checked_add(1)
            .ok_or(SeqLogError::KeySpaceExhausted { last: probe.key })
    }

    /// Write one record at `offset` and apply the sync strategy
    fn append(&self, writer: &mut WriterState, line: &[u8], offset: u64) -> io::Result<()> {
        self.file.write_all_at(line, offset)?;

        match self.config.sync_strategy {
            SyncStrategy::EveryWrite => self.file.sync_data()?,
            SyncStrategy::EveryNEntries { count } => {
                writer.unsynced += 1;
                if writer.unsynced >= count {
                    self.file.sync_data()?;
                    writer.unsynced = 0;
                }
            }
            SyncStrategy::OsManaged => {}
        }

        Ok(())
    }
}
