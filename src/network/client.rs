//! Blocking client
//!
//! Speaks the wire protocol to a running server; used by the CLI.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, SeqLogError};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// A single connection to a SeqLog server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| SeqLogError::Network(format!("Failed to connect: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Append a value and return the key the server allocated
    pub fn insert(&mut self, value: &[u8]) -> Result<u64> {
        let response = self.call(&Command::Insert {
            value: value.to_vec(),
        })?;

        match response.status {
            Status::Ok => response.key().ok_or_else(|| {
                SeqLogError::Protocol("INSERT response carried no key".to_string())
            }),
            _ => Err(Self::unexpected(&response)),
        }
    }

    /// Fetch the value stored under `key`
    pub fn get(&mut self, key: u64) -> Result<Option<Vec<u8>>> {
        let response = self.call(&Command::Get { key })?;

        match response.status {
            Status::Ok => Ok(Some(response.payload.unwrap_or_default())),
            Status::NotFound => Ok(None),
            Status::Error => Err(Self::unexpected(&response)),
        }
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        let response = self.call(&Command::Ping)?;

        match response.status {
            Status::Ok => Ok(()),
            _ => Err(Self::unexpected(&response)),
        }
    }

    fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    fn unexpected(response: &Response) -> SeqLogError {
        match response.message() {
            Some(message) => SeqLogError::Network(format!("Server error: {}", message)),
            None => SeqLogError::Protocol(format!("Unexpected status {:?}", response.status)),
        }
    }
}
