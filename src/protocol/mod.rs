//! The command protocol spoken between applications and the routing daemon.
//!
//! Applications and the local routing daemon exchange a closed set of control
//! commands (client assignment, service offers, event subscriptions, security
//! policy responses, suspend) over a stream connection. Every command starts
//! with the same fixed 8-byte header followed by a per-command payload;
//! multi-byte fields are little-endian.
//!
//! ```text
//! +--------+--------+-----------------+-----------------------------------+
//! | id     | version|     client      |              size                 |
//! | (1B)   | (1B)   |     (2B LE)     |            (4B LE)                |
//! +--------+--------+-----------------+-----------------------------------+
//! |                        payload (size bytes)                           |
//! +-----------------------------------------------------------------------+
//! ```
//!
//! On the stream itself each serialized command is wrapped in a pair of
//! 4-byte frame tags (see [`START_TAG`] / [`END_TAG`]); the tags belong to
//! the endpoint framing, not to the command.
//!
//! # Example
//!
//! ```
//! use someip_ipc::protocol::{Command, SubscribeBase};
//! use someip_ipc::{ClientId, EventId, EventgroupId, InstanceId, MajorVersion, PendingId, ServiceId};
//!
//! let cmd = Command::Subscribe(SubscribeBase {
//!     client: ClientId(0x0077),
//!     service: ServiceId(0x1234),
//!     instance: InstanceId(0x5678),
//!     eventgroup: EventgroupId(0x0ABC),
//!     major: MajorVersion(1),
//!     event: EventId(0x0DEF),
//!     pending_id: PendingId(0x0042),
//! });
//!
//! let mut buffer = Vec::new();
//! cmd.serialize(&mut buffer).unwrap();
//! assert_eq!(Command::deserialize(&buffer).unwrap(), cmd);
//! ```

mod command;
mod header;
mod security;
mod subscribe;
mod types;

pub use command::{AssignClient, AssignClientAck, Command, OfferBase, Suspend};
pub use header::{
    CommandHeader, COMMAND_HEADER_SIZE, COMMAND_POSITION_CLIENT, COMMAND_POSITION_ID,
    COMMAND_POSITION_PAYLOAD, COMMAND_POSITION_SIZE, COMMAND_POSITION_VERSION,
};
pub use security::SecurityPolicyResponse;
pub use subscribe::{SubscribeBase, SUBSCRIBE_PAYLOAD_SIZE};
pub use types::{CommandId, ASSIGN_CLIENT_ACK_COMMAND_SIZE, COMMAND_VERSION};

use thiserror::Error;

/// Start tag delimiting the beginning of a framed command on the stream.
pub const START_TAG: [u8; 4] = [0x67, 0x37, 0x6D, 0x07];

/// End tag delimiting the end of a framed command on the stream.
pub const END_TAG: [u8; 4] = [0x07, 0x6D, 0x37, 0x67];

/// Size of a frame tag in bytes.
pub const TAG_SIZE: usize = 4;

/// Errors that can occur while serializing a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// The payload does not fit the 32-bit size field.
    #[error("payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Errors that can occur while deserializing a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeserializeError {
    /// The buffer is shorter than the fixed command header.
    #[error("command too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// The id byte does not name a known command.
    #[error("unknown command id: 0x{0:02X}")]
    UnknownId(u8),

    /// The size field claims more payload than the buffer holds, or the
    /// payload is shorter than the command's fixed layout.
    #[error("truncated command: expected {expected} payload bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}
