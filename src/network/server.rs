//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker
//! threads over a bounded channel.

use std::io::BufWriter;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::config::Config;
use crate::error::{Result, SeqLogError};
use crate::log::AppendLog;
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for SeqLog
pub struct Server {
    config: Config,
    log: Arc<AppendLog>,
    listener: Option<TcpListener>,
    shutdown: Arc<AtomicBool>,
}

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and wind down its workers
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Server {
    /// Create a new server with the given config and log
    pub fn new(config: Config, log: Arc<AppendLog>) -> Self {
        Self {
            config,
            log,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Bind the listen address without serving yet.
    ///
    /// Returns the bound address, which differs from the configured one
    /// when port 0 was requested.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if let Some(listener) = &self.listener {
            return Ok(listener.local_addr()?);
        }

        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            SeqLogError::Network(format!("Failed to bind {}: {}", self.config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        self.config.validate()?;
        let addr = self.bind()?;
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return Err(SeqLogError::Network("listener not bound".to_string())),
        };

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_pending);
        let workers = self.spawn_workers(rx)?;

        tracing::info!(
            "Listening on {} with {} workers",
            addr,
            self.config.worker_threads
        );

        while !self.shutdown.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", peer, e);
                        continue;
                    }

                    match tx.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(stream)) => {
                            tracing::warn!("All workers busy, rejecting {}", peer);
                            reject(stream, "server busy");
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::error!("Worker pool exited unexpectedly");
                            break;
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    /// Handle for stopping the server gracefully.
    ///
    /// `run` holds `&mut self` until it returns, so this handle is the only
    /// way to stop it. Take one before calling `run`.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    fn spawn_workers(&self, rx: Receiver<TcpStream>) -> Result<Vec<JoinHandle<()>>> {
        let mut workers = Vec::with_capacity(self.config.worker_threads);

        for id in 0..self.config.worker_threads {
            let rx = rx.clone();
            let log = Arc::clone(&self.log);
            let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

            let handle = thread::Builder::new()
                .name(format!("seqlog-worker-{}", id))
                .spawn(move || {
                    for stream in rx.iter() {
                        serve(stream, Arc::clone(&log), read_ms, write_ms);
                    }
                    tracing::trace!("Worker {} exiting", id);
                })?;
            workers.push(handle);
        }

        Ok(workers)
    }
}

/// Run one connection to completion on the current worker
fn serve(stream: TcpStream, log: Arc<AppendLog>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, log) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }

    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
    }
}

/// Tell a client we cannot serve it, then drop the socket
fn reject(stream: TcpStream, reason: &str) {
    let mut writer = BufWriter::new(stream);
    let _ = write_response(&mut writer, &Response::error(reason));
}
