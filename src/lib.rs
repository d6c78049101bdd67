//! # SeqLog
//!
//! A minimal append-only key-value store with:
//! - Dense integer keys allocated on insert (`0, 1, 2, ...`)
//! - One human-readable log file, one record per line
//! - Lookups by bisecting byte offsets directly on the file
//! - Rollback of partially written records
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (Acceptor + Worker Pool)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  INSERT / GET / PING
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     AppendLog                                │
//! │     (Serialized Inserts / Concurrent Positioned Reads)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Record    │          │   Offset    │
//!   │   Framing   │          │   Search    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SeqLogError, Result};
pub use config::{Config, SyncStrategy};
pub use log::AppendLog;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SeqLog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
