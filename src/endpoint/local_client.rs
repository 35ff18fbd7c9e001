//! The local client endpoint: one stream connection to the routing daemon.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Buf;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::IpcError;
use crate::protocol::{
    Command, CommandId, ASSIGN_CLIENT_ACK_COMMAND_SIZE, END_TAG, START_TAG, TAG_SIZE,
};

use super::config::EndpointConfig;
use super::host::{EndpointHost, RoutingHost};
use super::queue::SendQueue;
use super::state::{AtomicEndpointState, EndpointState, EndpointStats};

/// Size of the receive buffer: exactly one framed client-assignment
/// answer, the only message this endpoint expects from the daemon.
pub const LOCAL_RECV_BUFFER_SIZE: usize = 2 * TAG_SIZE + ASSIGN_CLIENT_ACK_COMMAND_SIZE;

/// SO_LINGER timeout on the daemon connection. Long enough for the ACK to
/// the FIN to reach the server endpoint before the socket is torn down.
const LINGER_TIMEOUT: Duration = Duration::from_secs(5);

/// One round of the drain poll in `stop()`.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Number of drain poll rounds in `stop()` (50 x 10 ms = 500 ms).
const DRAIN_POLL_ROUNDS: u32 = 50;

/// Grace period for the driver task to close the socket on `stop()`.
const TEARDOWN_TIMEOUT: Duration = Duration::from_millis(100);

/// User-registered callback fired on unrecoverable endpoint errors.
pub type ErrorHandler = Arc<dyn Fn() + Send + Sync>;

/// A client endpoint owning one stream connection to the local routing
/// daemon.
///
/// The endpoint frames and transmits queued command buffers in enqueue
/// order, delivers validated inbound frames to its routing host and
/// recovers from peer crashes by reconnecting with capped exponential
/// backoff. All socket activity runs on a single driver task, so
/// completions for one endpoint never race each other; the public
/// operations may be called from any thread.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use someip_ipc::endpoint::{EndpointConfig, EndpointHost, LocalClientEndpoint, RoutingHost};
///
/// struct Router;
/// impl RoutingHost for Router {
///     fn on_message(&self, data: &[u8], _remote: std::net::SocketAddr) {
///         println!("command payload: {data:02X?}");
///     }
/// }
/// struct Host;
/// impl EndpointHost for Host {}
///
/// # async fn run() {
/// let routing: Arc<dyn RoutingHost> = Arc::new(Router);
/// let host: Arc<dyn EndpointHost> = Arc::new(Host);
/// let config = EndpointConfig::new(
///     "127.0.0.1:0".parse().unwrap(),
///     "127.0.0.1:30499".parse().unwrap(),
/// );
///
/// let endpoint = LocalClientEndpoint::new(
///     config,
///     Arc::downgrade(&routing),
///     Arc::downgrade(&host),
/// );
/// endpoint.start();
/// // ... exchange commands ...
/// endpoint.stop().await;
/// # }
/// ```
pub struct LocalClientEndpoint {
    inner: Arc<Inner>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    config: EndpointConfig,
    state: AtomicEndpointState,
    // Lock order: queue before error_handler; neither is held across an
    // upcall or an await point.
    queue: Mutex<SendQueue>,
    error_handler: Mutex<Option<ErrorHandler>>,
    routing_host: Weak<dyn RoutingHost>,
    endpoint_host: Weak<dyn EndpointHost>,
    stats: Mutex<EndpointStats>,
    /// Wakes the driver when the queue gains a frozen buffer.
    send_pending: Notify,
    /// Nudges the driver out of a backoff wait or a quiet connection.
    wakeup: Notify,
    stop_requested: AtomicBool,
    restart_requested: AtomicBool,
    reconnect_counter: AtomicU32,
}

/// Why a connection (or connection attempt) ended.
enum ConnectionEnd {
    /// `stop()` was requested and the queue is drained.
    Stopped,
    /// The peer closed the stream.
    PeerClosed,
    /// Reset, bad descriptor or forced restart; reconnect from scratch.
    Restarted,
}

impl LocalClientEndpoint {
    /// Create a new endpoint in the `Closed` state.
    ///
    /// The host handles are non-owning on purpose: the hosts own the
    /// endpoint, not the other way around, and delivery stops silently
    /// once a host is gone.
    pub fn new(
        config: EndpointConfig,
        routing_host: Weak<dyn RoutingHost>,
        endpoint_host: Weak<dyn EndpointHost>,
    ) -> Self {
        let queue = SendQueue::new(config.max_message_size, config.queue_limit);
        Self {
            inner: Arc::new(Inner {
                state: AtomicEndpointState::new(EndpointState::Closed),
                queue: Mutex::new(queue),
                error_handler: Mutex::new(None),
                routing_host,
                endpoint_host,
                stats: Mutex::new(EndpointStats::default()),
                send_pending: Notify::new(),
                wakeup: Notify::new(),
                stop_requested: AtomicBool::new(false),
                restart_requested: AtomicBool::new(false),
                reconnect_counter: AtomicU32::new(0),
                config,
            }),
            driver: Mutex::new(None),
        }
    }

    /// Start connecting to the routing daemon.
    ///
    /// Spawns the endpoint's driver task on the current tokio runtime.
    /// No-op unless the endpoint is `Closed`.
    pub fn start(&self) {
        if !self.inner.state.load().is_closed() {
            return;
        }
        self.inner.queue.lock().unblock();
        self.inner.state.store(EndpointState::Connecting);

        let handle = tokio::spawn(drive(Arc::clone(&self.inner)));
        *self.driver.lock() = Some(handle);
    }

    /// Stop the endpoint for good.
    ///
    /// Blocks further sends, cancels a pending reconnect, polls the
    /// outbound queue for drain up to 500 ms while the socket is open,
    /// then tears the socket down and moves to `Terminal`. A stopped
    /// endpoint is not reused.
    pub async fn stop(&self) {
        self.inner.queue.lock().block();
        self.inner.stop_requested.store(true, Ordering::Release);
        let was_established = self.inner.state.load().is_established();
        self.inner.state.store(EndpointState::Draining);
        self.inner.wakeup.notify_one();

        if was_established {
            let mut times_slept = 0u32;
            while times_slept <= DRAIN_POLL_ROUNDS {
                if self.inner.queue.lock().is_drained() {
                    break;
                }
                sleep(DRAIN_POLL_INTERVAL).await;
                times_slept += 1;
            }
        }

        let handle = self.driver.lock().take();
        if let Some(mut handle) = handle {
            self.inner.wakeup.notify_one();
            if timeout(TEARDOWN_TIMEOUT, &mut handle).await.is_err() {
                // The driver did not exit in time; cancel it outright. The
                // socket closes when the task is dropped.
                handle.abort();
            }
        }

        self.inner.state.store(EndpointState::Terminal);
    }

    /// Force a reconnect cycle.
    ///
    /// Without `force` this is a no-op while a connect attempt is already
    /// in progress. Clears the outbound queue, unblocks sending, resets
    /// the reconnect pacing and drops the current connection.
    pub fn restart(&self, force: bool) {
        let state = self.inner.state.load();
        if (!force && state.is_connecting()) || state.is_closed() || state.is_terminal() {
            return;
        }
        self.inner.state.store(EndpointState::Connecting);
        {
            let mut queue = self.inner.queue.lock();
            queue.unblock();
            queue.clear();
        }
        self.inner.reconnect_counter.store(0, Ordering::Release);
        self.inner.restart_requested.store(true, Ordering::Release);
        self.inner.wakeup.notify_one();
    }

    /// Queue one serialized command for transmission.
    ///
    /// Never blocks. Returns `false` when sending is blocked, the message
    /// is oversize, the train guard trips or the queue limit would be
    /// exceeded; the caller may retry later.
    pub fn send(&self, data: &[u8]) -> bool {
        let accepted = self.inner.queue.lock().enqueue(data);
        if accepted {
            self.inner.send_pending.notify_one();
        }
        accepted
    }

    /// Serialize one command and queue it for transmission.
    ///
    /// Convenience over [`send`](Self::send); a refusal surfaces as
    /// [`IpcError::SendRefused`].
    pub fn send_command(&self, command: &Command) -> crate::error::Result<()> {
        let mut buffer = Vec::new();
        command.serialize(&mut buffer)?;
        if self.send(&buffer) {
            Ok(())
        } else {
            Err(IpcError::SendRefused)
        }
    }

    /// Register the error callback fired on unrecoverable failures.
    pub fn register_error_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.inner.error_handler.lock() = Some(Arc::new(handler));
    }

    /// Remove the registered error callback.
    pub fn unregister_error_handler(&self) {
        *self.inner.error_handler.lock() = None;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EndpointState {
        self.inner.state.load()
    }

    /// Snapshot of the endpoint counters.
    pub fn stats(&self) -> EndpointStats {
        self.inner.stats.lock().clone()
    }

    /// Snapshot of the outbound queue: (frozen buffers, queued bytes).
    pub fn status(&self) -> (usize, usize) {
        let queue = self.inner.queue.lock();
        (queue.len(), queue.queue_bytes())
    }

    /// The routing daemon's address.
    pub fn remote(&self) -> SocketAddr {
        self.inner.config.remote
    }

    /// The configured local bind address.
    pub fn local(&self) -> SocketAddr {
        self.inner.config.local
    }
}

impl std::fmt::Debug for LocalClientEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalClientEndpoint")
            .field("local", &self.inner.config.local)
            .field("remote", &self.inner.config.remote)
            .field("state", &self.inner.state.load())
            .finish()
    }
}

/// Connection driver: the single task owning the socket.
///
/// Serializes connect, read and write completions for one endpoint, which
/// is what keeps receives single-flight and wire order equal to enqueue
/// order.
async fn drive(inner: Arc<Inner>) {
    loop {
        if inner.stop_requested.load(Ordering::Acquire) {
            return;
        }
        inner.restart_requested.store(false, Ordering::Release);
        inner.state.store(EndpointState::Connecting);

        match inner.connect().await {
            Ok(stream) => {
                inner.reconnect_counter.store(0, Ordering::Release);
                inner.state.store(EndpointState::Established);
                inner.stats.lock().connection_up();
                if let Some(host) = inner.endpoint_host.upgrade() {
                    host.on_connect(inner.config.remote);
                }

                let end = inner.run_connection(stream).await;

                inner.stats.lock().connection_down();
                if let Some(host) = inner.endpoint_host.upgrade() {
                    host.on_disconnect(inner.config.remote);
                }

                match end {
                    ConnectionEnd::Stopped => return,
                    ConnectionEnd::PeerClosed | ConnectionEnd::Restarted => {
                        // Queued frames are stale once the daemon is gone;
                        // drop them and let senders queue fresh ones.
                        let mut queue = inner.queue.lock();
                        queue.clear();
                        queue.unblock();
                    }
                }
            }
            Err(e) => {
                debug!("local endpoint: connect to {} failed: {e}", inner.config.remote);
                inner.stats.lock().connect_failed();
            }
        }

        if inner.stop_requested.load(Ordering::Acquire) {
            return;
        }

        // Connect timer: pace the next attempt.
        let attempt = inner.reconnect_counter.fetch_add(1, Ordering::AcqRel);
        if !inner.config.retry_policy.should_retry(attempt) {
            inner.max_allowed_reconnects_reached(attempt);
            inner.state.store(EndpointState::Terminal);
            return;
        }
        inner.stats.lock().reconnect_scheduled();

        let delay = inner.config.retry_policy.delay_for_attempt(attempt);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = inner.wakeup.notified() => {}
        }
    }
}

impl Inner {
    /// One connect attempt with the endpoint's socket options applied.
    ///
    /// Option failures are logged and non-fatal, except for the local
    /// bind, which routes straight to the connect-error path. The
    /// connecting timer bounds the attempt.
    async fn connect(&self) -> io::Result<TcpStream> {
        let socket = if self.config.remote.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        if let Err(e) = socket.set_reuseaddr(true) {
            warn!("local endpoint: cannot enable SO_REUSEADDR: {e}");
        }
        if let Err(e) = socket.set_keepalive(true) {
            warn!("local endpoint: cannot enable keep-alive: {e}");
        }
        if let Err(e) = socket.bind(self.config.local) {
            warn!(
                "local endpoint: cannot bind to client port {}: {e}",
                self.config.local.port()
            );
            return Err(e);
        }

        let connecting = socket.connect(self.config.remote);
        let stream = match timeout(self.config.connecting_timeout, connecting).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect attempt timed out",
                ))
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("local endpoint: cannot disable Nagle algorithm: {e}");
        }
        // Five seconds of linger so the FIN/ACK exchange of this internal
        // connection can complete before the socket goes away.
        if let Err(e) = stream.set_linger(Some(LINGER_TIMEOUT)) {
            warn!("local endpoint: cannot enable SO_LINGER: {e}");
        }

        Ok(stream)
    }

    /// Operate one established connection until it ends.
    async fn run_connection(&self, stream: TcpStream) -> ConnectionEnd {
        let (mut reader, mut writer) = stream.into_split();
        let mut recv_buffer = [0u8; LOCAL_RECV_BUFFER_SIZE];

        loop {
            // Flush every frozen buffer; popping under the queue lock and
            // writing outside of it keeps wire order equal to pop order on
            // this single task.
            loop {
                let next = self.queue.lock().pop_front();
                let Some(buffer) = next else { break };
                if let Err(e) = write_framed(&mut writer, &buffer).await {
                    warn!("local endpoint: send failed: {e}");
                    return self.classify_send_error(e);
                }
                self.stats.lock().frame_sent(buffer.len());
            }

            if self.stop_requested.load(Ordering::Acquire) && self.queue.lock().is_drained() {
                // Graceful teardown: push the FIN out before dropping.
                let _ = writer.shutdown().await;
                return ConnectionEnd::Stopped;
            }
            if self.restart_requested.load(Ordering::Acquire) {
                return ConnectionEnd::Restarted;
            }

            tokio::select! {
                _ = self.send_pending.notified() => {}
                _ = self.wakeup.notified() => {}
                result = reader.read(&mut recv_buffer) => match result {
                    Ok(0) => {
                        info!("local endpoint: routing daemon closed the connection");
                        return ConnectionEnd::PeerClosed;
                    }
                    Ok(n) => self.handle_frame(&recv_buffer[..n]),
                    Err(e) => {
                        info!("local endpoint: receive error: {e}");
                        match e.kind() {
                            io::ErrorKind::ConnectionReset | io::ErrorKind::NotConnected => {
                                return ConnectionEnd::Restarted;
                            }
                            _ => self.invoke_error_handler(),
                        }
                    }
                },
            }
        }
    }

    /// Validate one inbound frame and deliver it to the routing host.
    ///
    /// Only the client-assignment answer is expected on this endpoint: the
    /// frame must be exactly one receive buffer, carry both tags and the
    /// right command id at its first payload byte. Anything else is
    /// silently dropped and the next receive armed by the caller's loop.
    fn handle_frame(&self, frame: &[u8]) {
        if frame.len() == LOCAL_RECV_BUFFER_SIZE
            && frame[..TAG_SIZE] == START_TAG
            && frame[TAG_SIZE] == CommandId::AssignClientAck as u8
            && frame[LOCAL_RECV_BUFFER_SIZE - TAG_SIZE..] == END_TAG
        {
            let command = &frame[TAG_SIZE..LOCAL_RECV_BUFFER_SIZE - TAG_SIZE];
            self.stats.lock().frame_accepted(command.len());
            if let Some(host) = self.routing_host.upgrade() {
                host.on_message(command, self.config.remote);
            }
        } else {
            debug!(
                "local endpoint: dropping malformed frame of {} bytes",
                frame.len()
            );
        }
    }

    fn classify_send_error(&self, e: io::Error) -> ConnectionEnd {
        match e.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected => ConnectionEnd::Restarted,
            _ => {
                self.invoke_error_handler();
                ConnectionEnd::Restarted
            }
        }
    }

    /// Invoke the registered error handler, outside of any lock.
    fn invoke_error_handler(&self) {
        let handler = self.error_handler.lock().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    fn max_allowed_reconnects_reached(&self, attempts: u32) {
        warn!(
            "local endpoint: maximum allowed reconnects reached after {attempts} attempts \
             (remote {})",
            self.config.remote
        );
        self.invoke_error_handler();
    }
}

/// Write one command buffer with its start and end tags as a single
/// gathered sequence.
async fn write_framed(writer: &mut OwnedWriteHalf, payload: &[u8]) -> io::Result<()> {
    let mut frame = Buf::chain(&START_TAG[..], payload).chain(&END_TAG[..]);
    writer.write_all_buf(&mut frame).await
}

#[cfg(test)]
mod tests {
    use super::super::config::RetryPolicy;
    use super::*;
    use crate::protocol::AssignClientAck;
    use crate::types::ClientId;
    use std::sync::atomic::AtomicBool;
    use tokio::net::TcpListener;

    struct RecordingHost {
        messages: Mutex<Vec<Vec<u8>>>,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }
    }

    impl RoutingHost for RecordingHost {
        fn on_message(&self, data: &[u8], _remote: SocketAddr) {
            self.messages.lock().push(data.to_vec());
        }
    }

    struct NullHost;

    impl EndpointHost for NullHost {}

    fn endpoint_for(
        remote: SocketAddr,
        routing: &Arc<RecordingHost>,
        host: &Arc<NullHost>,
    ) -> LocalClientEndpoint {
        let config = EndpointConfig::new("127.0.0.1:0".parse().unwrap(), remote);
        LocalClientEndpoint::new(
            config,
            Arc::downgrade(&(routing.clone() as Arc<dyn RoutingHost>)),
            Arc::downgrade(&(host.clone() as Arc<dyn EndpointHost>)),
        )
    }

    fn ack_frame(assigned: u16) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&START_TAG);
        Command::AssignClientAck(AssignClientAck {
            client: ClientId(assigned),
            assigned: ClientId(assigned),
        })
        .serialize(&mut frame)
        .unwrap();
        frame.extend_from_slice(&END_TAG);
        assert_eq!(frame.len(), LOCAL_RECV_BUFFER_SIZE);
        frame
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_cold_start_delivers_assign_client_ack() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (mut daemon, _) = listener.accept().await.unwrap();
        daemon.write_all(&ack_frame(0x0101)).await.unwrap();

        assert!(wait_until(|| !routing.messages.lock().is_empty()).await);
        {
            let messages = routing.messages.lock();
            assert_eq!(messages.len(), 1);
            // The command without its tags: buffer size minus 8 bytes,
            // starting at offset 4.
            assert_eq!(messages[0].len(), LOCAL_RECV_BUFFER_SIZE - 2 * TAG_SIZE);
            assert_eq!(
                Command::deserialize(&messages[0]).unwrap(),
                Command::AssignClientAck(AssignClientAck {
                    client: ClientId(0x0101),
                    assigned: ClientId(0x0101),
                })
            );
        }

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_frame_dropped_and_receive_rearmed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (mut daemon, _) = listener.accept().await.unwrap();

        let mut bad = ack_frame(0x0101);
        let last = bad.len() - 1;
        bad[last] = 0x00; // corrupt the end tag
        daemon.write_all(&bad).await.unwrap();
        sleep(Duration::from_millis(100)).await;
        assert!(routing.messages.lock().is_empty());

        // Receive was re-armed: a well-formed frame still arrives.
        daemon.write_all(&ack_frame(0x0202)).await.unwrap();
        assert!(wait_until(|| routing.messages.lock().len() == 1).await);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_peer_close_clears_queue_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (mut daemon, _) = listener.accept().await.unwrap();
        daemon.write_all(&ack_frame(0x0101)).await.unwrap();
        assert!(wait_until(|| routing.messages.lock().len() == 1).await);

        drop(daemon); // daemon crashes

        // Exactly one reconnect shows up at the listener.
        let (_daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);
        assert_eq!(endpoint.status(), (0, 0));
        assert_eq!(endpoint.stats().connects, 2);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_connection_reset_forces_restart() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);

        // Zero linger turns the close into an RST.
        daemon.set_linger(Some(Duration::ZERO)).unwrap();
        drop(daemon);

        let (_daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);
        assert_eq!(endpoint.stats().connects, 2);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_fifo_framing_on_the_wire() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (mut daemon, _) = listener.accept().await.unwrap();

        let payloads: Vec<Vec<u8>> = (0..4u8).map(|i| vec![i; 16 + i as usize]).collect();
        for payload in &payloads {
            assert!(endpoint.send(payload));
        }

        let mut expected = Vec::new();
        for payload in &payloads {
            expected.extend_from_slice(&START_TAG);
            expected.extend_from_slice(payload);
            expected.extend_from_slice(&END_TAG);
        }

        let mut received = vec![0u8; expected.len()];
        daemon.read_exact(&mut received).await.unwrap();
        assert_eq!(received, expected);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_queue_limit_back_pressure() {
        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let config = EndpointConfig::new(
            "127.0.0.1:0".parse().unwrap(),
            "127.0.0.1:30499".parse().unwrap(),
        )
        .with_max_message_size(256)
        .with_queue_limit(1024);
        let endpoint =
            LocalClientEndpoint::new(
                config,
                Arc::downgrade(&(routing.clone() as Arc<dyn RoutingHost>)),
                Arc::downgrade(&(host.clone() as Arc<dyn EndpointHost>)),
            );

        // Nothing is connected; frames pile up in the queue.
        for _ in 0..4 {
            assert!(endpoint.send(&[0xAB; 256]));
        }
        assert!(!endpoint.send(&[0xAB; 256]));
        assert_eq!(endpoint.status(), (4, 1024));
    }

    #[tokio::test]
    async fn test_send_command_serializes_and_queues() {
        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let config = EndpointConfig::new(
            "127.0.0.1:0".parse().unwrap(),
            "127.0.0.1:30499".parse().unwrap(),
        )
        .with_queue_limit(8); // room for exactly one header-only command
        let endpoint =
            LocalClientEndpoint::new(
                config,
                Arc::downgrade(&(routing.clone() as Arc<dyn RoutingHost>)),
                Arc::downgrade(&(host.clone() as Arc<dyn EndpointHost>)),
            );

        let suspend = Command::Suspend(crate::protocol::Suspend {
            client: ClientId(0x0042),
        });
        endpoint.send_command(&suspend).unwrap();
        assert_eq!(endpoint.status(), (1, 8));
        assert!(matches!(
            endpoint.send_command(&suspend),
            Err(IpcError::SendRefused)
        ));
    }

    #[tokio::test]
    async fn test_stop_drains_and_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (mut daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);

        assert!(endpoint.send(&[0x11; 32]));
        endpoint.stop().await;
        assert!(endpoint.state().is_terminal());
        assert!(!endpoint.send(&[0x22; 8]));

        // The queued frame still arrives, then the daemon observes EOF
        // within the teardown budget.
        let mut frame = vec![0u8; 32 + 2 * TAG_SIZE];
        daemon.read_exact(&mut frame).await.unwrap();
        let mut probe = [0u8; 1];
        let n = timeout(Duration::from_millis(600), daemon.read(&mut probe))
            .await
            .expect("socket not closed in time")
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();
        endpoint.start(); // no-op: not Closed anymore

        let (_daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);
        assert_eq!(endpoint.stats().connects, 1);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_forced_restart_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let endpoint = endpoint_for(remote, &routing, &host);
        endpoint.start();

        let (_daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.state().is_established()).await);

        endpoint.restart(true);
        let (_daemon, _) = listener.accept().await.unwrap();
        assert!(wait_until(|| endpoint.stats().connects == 2).await);

        endpoint.stop().await;
    }

    #[tokio::test]
    async fn test_reconnect_budget_exhaustion_fires_handler() {
        // Bind and immediately drop a listener so the port refuses.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote = listener.local_addr().unwrap();
        drop(listener);

        let routing = Arc::new(RecordingHost::new());
        let host = Arc::new(NullHost);
        let config = EndpointConfig::new("127.0.0.1:0".parse().unwrap(), remote)
            .with_retry_policy(RetryPolicy::fixed(1, Duration::from_millis(10)));
        let endpoint =
            LocalClientEndpoint::new(
                config,
                Arc::downgrade(&(routing.clone() as Arc<dyn RoutingHost>)),
                Arc::downgrade(&(host.clone() as Arc<dyn EndpointHost>)),
            );

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        endpoint.register_error_handler(move || flag.store(true, Ordering::SeqCst));

        endpoint.start();
        assert!(wait_until(|| fired.load(Ordering::SeqCst)).await);
        assert!(wait_until(|| endpoint.state().is_terminal()).await);
    }
}
