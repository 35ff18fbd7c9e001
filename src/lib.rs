//! Local SOME/IP control plane: command codec, client endpoint and E2E CRC
//! profiles.
//!
//! This crate implements the intra-host side of a SOME/IP middleware
//! runtime:
//!
//! - The **command protocol** ([`protocol`]) applications and the local
//!   routing daemon speak over a stream connection: a closed set of control
//!   commands (client assignment, offers, subscriptions, security policy
//!   responses, suspend) with a fixed little-endian header
//! - The **local client endpoint** ([`endpoint`], requires the default
//!   `tokio` feature): the connect/reconnect/send/receive lifecycle of that
//!   stream connection, with framed message delimitation, bounded outbound
//!   queueing and recovery from daemon restarts
//! - The **E2E CRC engine** ([`e2e`]): the table-driven CRC kernels used to
//!   protect payloads end to end
//!
//! # Wire format
//!
//! On the local stream every command travels between a pair of 4-byte frame
//! tags:
//!
//! ```text
//! +-------------+----------------------------------+-------------+
//! | 67 37 6D 07 | command: header (8B) + payload   | 07 6D 37 67 |
//! +-------------+----------------------------------+-------------+
//! ```
//!
//! # Example
//!
//! ```
//! use someip_ipc::protocol::{Command, SubscribeBase};
//! use someip_ipc::{ClientId, EventId, EventgroupId, InstanceId, MajorVersion, PendingId, ServiceId};
//!
//! let subscribe = Command::Subscribe(SubscribeBase {
//!     client: ClientId(0x0077),
//!     service: ServiceId(0x1234),
//!     instance: InstanceId(0x5678),
//!     eventgroup: EventgroupId(0x0ABC),
//!     major: MajorVersion(1),
//!     event: EventId::ANY,
//!     pending_id: PendingId(0x0042),
//! });
//!
//! let mut wire = Vec::new();
//! subscribe.serialize(&mut wire).unwrap();
//! assert_eq!(Command::deserialize(&wire).unwrap(), subscribe);
//! ```

pub mod e2e;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{IpcError, Result};
pub use protocol::{Command, CommandHeader, CommandId, DeserializeError, SerializeError};
pub use types::{
    ClientId, EventId, EventgroupId, InstanceId, MajorVersion, MinorVersion, PendingId, ServiceId,
};

#[cfg(feature = "tokio")]
pub use endpoint::{EndpointConfig, EndpointHost, LocalClientEndpoint, RoutingHost};
