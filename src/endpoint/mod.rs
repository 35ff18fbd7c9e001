//! Local client endpoints towards the routing daemon.
//!
//! This module provides:
//! - The stream endpoint connecting an application to the local routing
//!   daemon, with framed transmission and transparent reconnect
//! - Configuration for message and queue limits and reconnect pacing
//! - The upcall traits the routing layer implements to receive inbound
//!   commands and lifecycle events
//!
//! The endpoint state machine:
//!
//! ```text
//! Closed ──start──▶ Connecting ──ok──▶ Established ──stop──▶ Draining ──▶ Terminal
//!   ▲                   │                       │
//!   │                   │ err / timeout         │ eof / reset
//!   │                   ▼                       │
//!   └──stop──────── (backoff wait) ◀────────────┘
//! ```

mod config;
mod host;
mod queue;
mod state;

#[cfg(feature = "tokio")]
mod local_client;

pub use config::{
    BackoffStrategy, EndpointConfig, RetryPolicy, DEFAULT_CONNECTING_TIMEOUT,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_LOCAL_MESSAGE_SIZE, MAX_CONNECT_TIMEOUT,
};
pub use host::{EndpointHost, RoutingHost};
pub use state::{EndpointState, EndpointStats};

#[cfg(feature = "tokio")]
pub use local_client::{ErrorHandler, LocalClientEndpoint, LOCAL_RECV_BUFFER_SIZE};
