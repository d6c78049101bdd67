//! Response definitions
//!
//! Represents responses to clients.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (value for GET, key for INSERT, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create the OK response to an INSERT
    pub fn inserted(key: u64) -> Self {
        Self::ok(Some(key.to_be_bytes().to_vec()))
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Interpret the payload of an INSERT response as a key
    pub fn key(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.payload.as_deref()?.try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Error message carried by an ERROR response
    pub fn message(&self) -> Option<String> {
        match self.status {
            Status::Error => self
                .payload
                .as_deref()
                .map(|p| String::from_utf8_lossy(p).into_owned()),
            _ => None,
        }
    }
}
