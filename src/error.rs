//! Error types for the local SOME/IP control plane.

use std::io;
use thiserror::Error;

use crate::protocol::{DeserializeError, SerializeError};

/// Errors that can occur in the local control plane.
#[derive(Error, Debug)]
pub enum IpcError {
    /// I/O error on the stream to the routing daemon.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A command failed to serialize.
    #[error("serialize error: {0}")]
    Serialize(#[from] SerializeError),

    /// A command failed to deserialize.
    #[error("deserialize error: {0}")]
    Deserialize(#[from] DeserializeError),

    /// The endpoint refused the message: sending blocked, the message is
    /// oversize or the queue limit would be exceeded. Retry later.
    #[error("endpoint refused the message")]
    SendRefused,

    /// The configured reconnect budget has been exhausted.
    #[error("maximum allowed reconnects reached ({0})")]
    MaxReconnectsReached(u32),
}

/// Result type alias for local control plane operations.
pub type Result<T> = std::result::Result<T, IpcError>;

impl IpcError {
    /// Check if this error is transient and worth retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if e.kind() == io::ErrorKind::WouldBlock
                || e.kind() == io::ErrorKind::TimedOut
                || e.kind() == io::ErrorKind::Interrupted
        ) || matches!(self, Self::SendRefused)
    }
}
