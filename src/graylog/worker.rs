//! Worker thread driving the Graylog connection state machine.
//!
//! The worker owns the socket exclusively. Each loop iteration checks the
//! shutdown flag, applies the re-resolution escalation, then runs the handler
//! for the current [`ConnectionState`], which returns the next state. No
//! handler suspends for longer than one configured slice, except for the
//! platform resolver during address lookup.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Instant,
};

use log::{debug, warn};

use crate::handoff_queue::HandoffQueue;

use super::{
    config::ConnectionConfig,
    serialise::WirePayload,
    state::{AtomicConnectionState, ConnectionState},
    transport::{ConnectProgress, Connection, PeerStatus, PendingConnection, Resolve},
};

/// Payload currently being written and how many bytes already left.
struct Outgoing {
    payload: WirePayload,
    cursor: usize,
}

impl Outgoing {
    fn remaining(&self) -> &[u8] {
        &self.payload.as_bytes()[self.cursor..]
    }

    fn is_complete(&self) -> bool {
        self.cursor >= self.payload.len()
    }
}

/// Handles shared between the worker and its owning connection.
pub(crate) struct WorkerShared {
    pub(crate) queue: Arc<HandoffQueue<WirePayload>>,
    pub(crate) status: Arc<AtomicConnectionState>,
    pub(crate) shutdown: Arc<AtomicBool>,
}

pub(crate) struct ConnectionWorker<R: Resolve> {
    config: ConnectionConfig,
    resolver: R,
    shared: WorkerShared,
    state: ConnectionState,
    addresses: Vec<SocketAddr>,
    pending: Option<PendingConnection>,
    connection: Option<Connection>,
    outgoing: Option<Outgoing>,
    connect_tries: u32,
    deadline: Instant,
}

impl<R: Resolve> ConnectionWorker<R> {
    pub(crate) fn new(config: ConnectionConfig, resolver: R, shared: WorkerShared) -> Self {
        Self {
            deadline: Instant::now() + config.retry_delay,
            config,
            resolver,
            shared,
            state: ConnectionState::Idle,
            addresses: Vec::new(),
            pending: None,
            connection: None,
            outgoing: None,
            connect_tries: 0,
        }
    }

    /// Run until the shutdown flag is raised.
    pub(crate) fn run(mut self) {
        self.set_state(ConnectionState::ResolvingAddress);
        while !self.shared.shutdown.load(Ordering::Acquire) {
            if self.connect_tries > self.config.max_connect_tries {
                debug!(
                    "graylog: {} failed connection attempts to {}:{}; resolving address again",
                    self.connect_tries, self.config.host, self.config.port
                );
                self.connect_tries = 0;
                self.drop_sockets();
                self.arm_deadline();
                self.set_state(ConnectionState::AddressRetryWait);
            }
            let next = match self.state {
                ConnectionState::ResolvingAddress => self.resolve(),
                ConnectionState::AddressRetryWait => {
                    self.wait_until_deadline(ConnectionState::ResolvingAddress)
                }
                ConnectionState::Connecting => self.connect(),
                ConnectionState::ConnectRetryRebind => {
                    self.wait_until_deadline(ConnectionState::Connecting)
                }
                ConnectionState::ConnectWait => self.connect_wait(),
                ConnectionState::Ready => self.ready(),
                ConnectionState::Sending => self.send(),
                ConnectionState::Idle => ConnectionState::ResolvingAddress,
            };
            self.set_state(next);
        }
        self.drop_sockets();
        self.set_state(ConnectionState::Idle);
        debug!(
            "graylog: worker for {}:{} stopped with {} queued payloads",
            self.config.host,
            self.config.port,
            self.shared.queue.len()
        );
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("graylog: {} -> {}", self.state, state);
        }
        self.state = state;
        self.shared.status.store(state);
    }

    fn arm_deadline(&mut self) {
        self.deadline = Instant::now() + self.config.retry_delay;
    }

    fn resolve(&mut self) -> ConnectionState {
        match self.resolver.resolve(&self.config.host, self.config.port) {
            Ok(addrs) if !addrs.is_empty() => {
                self.addresses = addrs;
                ConnectionState::Connecting
            }
            Ok(_) => self.resolve_failed(io::Error::new(
                io::ErrorKind::NotFound,
                "resolver returned no addresses",
            )),
            Err(err) => self.resolve_failed(err),
        }
    }

    fn resolve_failed(&mut self, err: io::Error) -> ConnectionState {
        warn!(
            "graylog: unable to resolve {}:{}: {err}; retrying in {:?}",
            self.config.host, self.config.port, self.config.retry_delay
        );
        self.arm_deadline();
        ConnectionState::AddressRetryWait
    }

    fn wait_until_deadline(&mut self, next: ConnectionState) -> ConnectionState {
        let now = Instant::now();
        if now >= self.deadline {
            return next;
        }
        thread::sleep(self.config.idle_slice.min(self.deadline - now));
        self.state
    }

    fn connect(&mut self) -> ConnectionState {
        for addr in &self.addresses {
            match PendingConnection::start(*addr) {
                Ok(pending) => {
                    self.pending = Some(pending);
                    self.arm_deadline();
                    return ConnectionState::ConnectWait;
                }
                Err(err) => debug!("graylog: connect to {addr} failed: {err}"),
            }
        }
        self.connect_tries += 1;
        warn!(
            "graylog: unable to connect to {}:{} (attempt {}); retrying in {:?}",
            self.config.host, self.config.port, self.connect_tries, self.config.retry_delay
        );
        self.arm_deadline();
        ConnectionState::ConnectRetryRebind
    }

    fn connect_wait(&mut self) -> ConnectionState {
        let Some(pending) = self.pending.take() else {
            return ConnectionState::Connecting;
        };
        if Instant::now() > self.deadline {
            debug!("graylog: timed out connecting to {}", pending.addr());
            self.connect_tries += 1;
            return ConnectionState::Connecting;
        }
        match pending.poll(self.config.connect_poll_slice) {
            ConnectProgress::Pending(pending) => {
                self.pending = Some(pending);
                ConnectionState::ConnectWait
            }
            ConnectProgress::Connected(connection) => {
                debug!("graylog: connected to {}", connection.peer());
                self.connection = Some(connection);
                self.outgoing = None;
                self.connect_tries = 0;
                ConnectionState::Ready
            }
            ConnectProgress::Failed(err) => {
                debug!("graylog: connect failed: {err}");
                self.connect_tries += 1;
                ConnectionState::Connecting
            }
        }
    }

    fn ready(&mut self) -> ConnectionState {
        let Some(connection) = self.connection.as_mut() else {
            return ConnectionState::Connecting;
        };
        match connection.probe() {
            PeerStatus::Open => {}
            PeerStatus::Closed => {
                debug!("graylog: server {} closed the connection", connection.peer());
                self.close_connection();
                return ConnectionState::Connecting;
            }
            PeerStatus::Failed(err) => {
                debug!("graylog: connection error: {err}");
                self.close_connection();
                return ConnectionState::Connecting;
            }
        }
        match self.shared.queue.peek(self.config.idle_slice) {
            Some(payload) => {
                self.outgoing = Some(Outgoing { payload, cursor: 0 });
                ConnectionState::Sending
            }
            None => ConnectionState::Ready,
        }
    }

    fn send(&mut self) -> ConnectionState {
        let (Some(connection), Some(outgoing)) = (self.connection.as_mut(), self.outgoing.as_mut())
        else {
            return ConnectionState::Ready;
        };
        match connection.write_some(outgoing.remaining()) {
            Ok(written) => {
                outgoing.cursor += written;
                if outgoing.is_complete() {
                    let sent = self.shared.queue.try_pop();
                    debug_assert!(sent.is_some(), "sent payload left the queue early");
                    self.outgoing = None;
                    return ConnectionState::Ready;
                }
                ConnectionState::Sending
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(self.config.write_backoff);
                ConnectionState::Sending
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => ConnectionState::Sending,
            Err(err) => {
                warn!(
                    "graylog: write to {} failed after {} bytes: {err}",
                    connection.peer(),
                    outgoing.cursor
                );
                self.outgoing = None;
                self.close_connection();
                ConnectionState::Connecting
            }
        }
    }

    fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }

    fn drop_sockets(&mut self) {
        self.pending = None;
        self.outgoing = None;
        self.close_connection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graylog::serialise::frame_payload;
    use parking_lot::Mutex;
    use std::{net::TcpListener, time::Duration};

    fn shared(capacity: usize) -> WorkerShared {
        WorkerShared {
            queue: Arc::new(HandoffQueue::new(capacity)),
            status: Arc::new(AtomicConnectionState::new(ConnectionState::Idle)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fast_config(port: u16) -> ConnectionConfig {
        let mut config = ConnectionConfig::new("localhost", port);
        config.retry_delay = Duration::from_millis(20);
        config.idle_slice = Duration::from_millis(5);
        config.connect_poll_slice = Duration::from_millis(5);
        config
    }

    #[test]
    fn outgoing_tracks_partial_progress() {
        let mut outgoing = Outgoing {
            payload: frame_payload("abcd"),
            cursor: 0,
        };
        outgoing.cursor += 2;
        assert_eq!(outgoing.remaining(), b"cd\0");
        assert!(!outgoing.is_complete());
        outgoing.cursor += 3;
        assert!(outgoing.is_complete());
    }

    #[test]
    fn failed_resolution_arms_retry_deadline() {
        let resolver = |_: &str, _: u16| -> io::Result<Vec<SocketAddr>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such host"))
        };
        let mut worker = ConnectionWorker::new(fast_config(1), resolver, shared(1));
        let before = Instant::now();
        assert_eq!(worker.resolve(), ConnectionState::AddressRetryWait);
        assert!(worker.deadline >= before + Duration::from_millis(20));
    }

    #[test]
    fn empty_resolution_is_a_failure() {
        let resolver = |_: &str, _: u16| -> io::Result<Vec<SocketAddr>> { Ok(Vec::new()) };
        let mut worker = ConnectionWorker::new(fast_config(1), resolver, shared(1));
        assert_eq!(worker.resolve(), ConnectionState::AddressRetryWait);
    }

    #[test]
    fn wait_state_holds_until_deadline() {
        let resolver = |_: &str, _: u16| -> io::Result<Vec<SocketAddr>> { Ok(Vec::new()) };
        let mut worker = ConnectionWorker::new(fast_config(1), resolver, shared(1));
        worker.state = ConnectionState::ConnectRetryRebind;
        worker.deadline = Instant::now() + Duration::from_secs(60);
        assert_eq!(
            worker.wait_until_deadline(ConnectionState::Connecting),
            ConnectionState::ConnectRetryRebind
        );
        worker.deadline = Instant::now();
        assert_eq!(
            worker.wait_until_deadline(ConnectionState::Connecting),
            ConnectionState::Connecting
        );
    }

    #[test]
    fn connect_without_addresses_counts_a_try() {
        let resolver = |_: &str, _: u16| -> io::Result<Vec<SocketAddr>> { Ok(Vec::new()) };
        let mut worker = ConnectionWorker::new(fast_config(1), resolver, shared(1));
        assert_eq!(worker.connect(), ConnectionState::ConnectRetryRebind);
        assert_eq!(worker.connect_tries, 1);
    }

    #[test]
    fn refused_connects_resolve_again_after_retry_delay() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let lookups = Arc::new(Mutex::new(Vec::<Instant>::new()));
        let log = Arc::clone(&lookups);
        let resolver = move |_: &str, port: u16| -> io::Result<Vec<SocketAddr>> {
            log.lock().push(Instant::now());
            Ok(vec![SocketAddr::from(([127, 0, 0, 1], port))])
        };
        let config = fast_config(port);
        let retry_delay = config.retry_delay;
        let shared = shared(4);
        let shutdown = Arc::clone(&shared.shutdown);
        let worker = ConnectionWorker::new(config, resolver, shared);
        let handle = thread::spawn(move || worker.run());

        let deadline = Instant::now() + Duration::from_secs(5);
        while lookups.lock().len() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        shutdown.store(true, Ordering::Release);
        handle.join().unwrap();

        let lookups = lookups.lock();
        assert!(lookups.len() >= 3, "only {} lookups", lookups.len());
        for pair in lookups.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= retry_delay, "lookups only {gap:?} apart");
        }
    }

    #[test]
    fn payload_survives_failed_write() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = shared(4);
        let queue = Arc::clone(&shared.queue);
        let resolver = move |_: &str, _: u16| -> io::Result<Vec<SocketAddr>> { Ok(vec![addr]) };
        let mut worker = ConnectionWorker::new(fast_config(addr.port()), resolver, shared);

        assert_eq!(worker.resolve(), ConnectionState::Connecting);
        assert_eq!(worker.connect(), ConnectionState::ConnectWait);
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut state = ConnectionState::ConnectWait;
        while state == ConnectionState::ConnectWait && Instant::now() < deadline {
            state = worker.connect_wait();
        }
        assert_eq!(state, ConnectionState::Ready);

        queue.push(frame_payload("keep me")).unwrap();
        worker.outgoing = Some(Outgoing {
            payload: queue.peek(Duration::ZERO).unwrap(),
            cursor: 3,
        });
        worker.close_connection();
        assert_eq!(worker.send(), ConnectionState::Ready);
        assert_eq!(queue.len(), 1, "payload must stay queued until fully sent");
    }
}
