//! Endpoint state management.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Lifecycle state of a local client endpoint.
///
/// An endpoint is created `Closed`, moves to `Connecting` on `start()` and
/// ends in `Terminal` on `stop()`; a stopped endpoint is not reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EndpointState {
    /// Created, not yet started.
    Closed = 0,
    /// Attempting to connect to the routing daemon.
    Connecting = 1,
    /// Connected and operational.
    Established = 2,
    /// Stopping; the outbound queue is being drained.
    Draining = 3,
    /// Stopped for good.
    Terminal = 4,
}

impl EndpointState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Connecting,
            2 => Self::Established,
            3 => Self::Draining,
            _ => Self::Terminal,
        }
    }

    /// Check if the endpoint has not been started yet.
    pub fn is_closed(&self) -> bool {
        *self == Self::Closed
    }

    /// Check if a connection attempt is in progress.
    pub fn is_connecting(&self) -> bool {
        *self == Self::Connecting
    }

    /// Check if the endpoint is connected and operational.
    pub fn is_established(&self) -> bool {
        *self == Self::Established
    }

    /// Check if the endpoint has been stopped for good.
    pub fn is_terminal(&self) -> bool {
        *self == Self::Terminal
    }
}

/// Atomically shared endpoint state cell.
#[derive(Debug)]
pub(crate) struct AtomicEndpointState(AtomicU8);

impl AtomicEndpointState {
    pub(crate) fn new(state: EndpointState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> EndpointState {
        EndpointState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: EndpointState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Counters describing an endpoint's life so far.
///
/// Maintained by the endpoint's driver task;
/// `LocalClientEndpoint::stats` hands out a snapshot.
#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    /// Connections established with the routing daemon.
    pub connects: u64,
    /// Connect attempts that failed or timed out.
    pub failed_connects: u64,
    /// Reconnect cycles entered after a lost or refused connection.
    pub reconnects: u64,
    /// Command buffers put on the wire.
    pub frames_sent: u64,
    /// Command bytes put on the wire, frame tags not counted.
    pub bytes_sent: u64,
    /// Inbound frames that passed validation and reached the routing host.
    pub frames_accepted: u64,
    /// Command bytes delivered to the routing host.
    pub bytes_accepted: u64,
    /// When the current connection came up; `None` while disconnected.
    pub connected_since: Option<Instant>,
}

impl EndpointStats {
    pub(crate) fn connection_up(&mut self) {
        self.connects += 1;
        self.connected_since = Some(Instant::now());
    }

    pub(crate) fn connection_down(&mut self) {
        self.connected_since = None;
    }

    pub(crate) fn connect_failed(&mut self) {
        self.failed_connects += 1;
    }

    pub(crate) fn reconnect_scheduled(&mut self) {
        self.reconnects += 1;
    }

    pub(crate) fn frame_sent(&mut self, command_bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += command_bytes as u64;
    }

    pub(crate) fn frame_accepted(&mut self, command_bytes: usize) {
        self.frames_accepted += 1;
        self.bytes_accepted += command_bytes as u64;
    }

    /// How long the current connection has been up.
    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.connected_since.map(|t| t.elapsed())
    }
}
