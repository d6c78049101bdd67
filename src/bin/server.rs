//! SeqLog Server Binary
//!
//! Opens the log file and serves it over TCP.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use seqlog::network::Server;
use seqlog::{AppendLog, Config, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// SeqLog Server
#[derive(Parser, Debug)]
#[command(name = "seqlog-server")]
#[command(about = "Append-only sequential key-value store")]
#[command(version)]
struct Args {
    /// Log file (created if missing)
    #[arg(short = 'f', long, default_value = "./seqlog.db")]
    log_file: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Worker threads serving connections
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// When to fsync appended records
    #[arg(long, value_enum, default_value = "os")]
    sync: SyncMode,

    /// Inserts between fsyncs with `--sync every-n`
    #[arg(long, default_value = "100")]
    sync_count: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncMode {
    EveryWrite,
    EveryN,
    Os,
}

impl Args {
    fn sync_strategy(&self) -> SyncStrategy {
        match self.sync {
            SyncMode::EveryWrite => SyncStrategy::EveryWrite,
            SyncMode::EveryN => SyncStrategy::EveryNEntries {
                count: self.sync_count,
            },
            SyncMode::Os => SyncStrategy::OsManaged,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,seqlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SeqLog Server v{}", seqlog::VERSION);
    tracing::info!("Log file: {}", args.log_file);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .log_path(&args.log_file)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .sync_strategy(args.sync_strategy())
        .build();

    let log = match AppendLog::open_with(config.clone()) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            tracing::error!("Failed to open log: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Log opened ({} bytes)", log.len());

    let mut server = Server::new(config, Arc::clone(&log));

    // Set up Ctrl+C handler
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = log.sync() {
        tracing::error!("Final sync failed: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
