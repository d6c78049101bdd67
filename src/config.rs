//! Configuration for SeqLog
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, SeqLogError};

/// Default chunk size for backward/forward delimiter scans
pub const DEFAULT_SCAN_CHUNK_SIZE: usize = 4096;

/// Main configuration for a SeqLog instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Path of the single log file. Only the file itself is created;
    /// its parent directory must already exist.
    pub log_path: PathBuf,

    /// Create the log file if it does not exist
    pub create_if_missing: bool,

    /// Bytes read per step when scanning for record boundaries
    pub scan_chunk_size: usize,

    /// Sync strategy: how often to fsync after an insert
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Accepted connections allowed to wait for a free worker (at least 1)
    pub max_pending: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Sync strategy for inserts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every insert (safest, slowest)
    EveryWrite,

    /// fsync after every N inserts (balanced durability/performance)
    EveryNEntries { count: usize },

    /// Leave flushing to the operating system
    OsManaged,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./seqlog.db"),
            create_if_missing: true,
            scan_chunk_size: DEFAULT_SCAN_CHUNK_SIZE,
            sync_strategy: SyncStrategy::OsManaged,
            listen_addr: "127.0.0.1:7070".to_string(),
            worker_threads: 8,
            max_pending: 128,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the log or server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scan_chunk_size == 0 {
            return Err(SeqLogError::Config(
                "scan_chunk_size must be greater than zero".to_string(),
            ));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(SeqLogError::Config(
                "EveryNEntries sync count must be greater than zero".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(SeqLogError::Config(
                "worker_threads must be greater than zero".to_string(),
            ));
        }
        if self.max_pending == 0 {
            return Err(SeqLogError::Config(
                "max_pending must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Create the log file when it is missing
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Set the delimiter scan chunk size (in bytes)
    pub fn scan_chunk_size(mut self, size: usize) -> Self {
        self.config.scan_chunk_size = size;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set how many accepted connections may queue for a worker
    pub fn max_pending(mut self, count: usize) -> Self {
        self.config.max_pending = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
