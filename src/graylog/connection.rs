//! Producer-facing side of a Graylog connection.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use parking_lot::Mutex;

use crate::{handoff_queue::HandoffQueue, rate_limited_warner::RateLimitedWarner};

use super::{
    config::ConnectionConfig,
    serialise::{WirePayload, frame_payload},
    state::{AtomicConnectionState, ConnectionState},
    transport::{Resolve, SystemResolver},
    worker::{ConnectionWorker, WorkerShared},
};

/// A TCP connection to a Graylog GELF input, maintained by a worker thread.
///
/// Payloads handed to [`send`](Self::send) are framed, queued and written in
/// order whenever the connection is up. The worker reconnects on its own after
/// resolution failures, refused connects or a peer close.
pub struct GraylogConnection {
    host: String,
    port: u16,
    queue: Arc<HandoffQueue<WirePayload>>,
    status: Arc<AtomicConnectionState>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    warner: RateLimitedWarner,
}

impl GraylogConnection {
    /// Start a connection using the system resolver.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_resolver(config, SystemResolver)
    }

    /// Start a connection resolving the host through `resolver`.
    pub fn with_resolver<R: Resolve>(config: ConnectionConfig, resolver: R) -> Self {
        let queue = Arc::new(HandoffQueue::new(config.queue_capacity));
        let status = Arc::new(AtomicConnectionState::new(ConnectionState::Idle));
        let shutdown = Arc::new(AtomicBool::new(false));
        let host = config.host.clone();
        let port = config.port;
        let warner = RateLimitedWarner::new(config.warn_interval);
        let worker = ConnectionWorker::new(
            config,
            resolver,
            WorkerShared {
                queue: Arc::clone(&queue),
                status: Arc::clone(&status),
                shutdown: Arc::clone(&shutdown),
            },
        );
        let handle = thread::Builder::new()
            .name(format!("graylog-{host}:{port}"))
            .spawn(move || worker.run());
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("graylog: unable to spawn connection worker for {host}:{port}: {err}");
                None
            }
        };
        Self {
            host,
            port,
            queue,
            status,
            shutdown,
            handle: Mutex::new(handle),
            warner,
        }
    }

    /// Frame `payload` and queue it for delivery.
    ///
    /// Never blocks on the network. When the queue is full the payload is
    /// dropped and reported through a rate-limited warning.
    pub fn send(&self, payload: impl Into<Vec<u8>>) {
        if self.queue.push(frame_payload(payload)).is_err() {
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                log::warn!(
                    "graylog: dropped {count} messages for {}:{}; send queue full",
                    self.host,
                    self.port
                );
            });
        }
    }

    pub fn connection_status(&self) -> ConnectionState {
        self.status.load()
    }

    pub fn queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Payloads still queued are discarded. Calling `close` more than once is
    /// harmless.
    pub fn close(&self) {
        self.shutdown.store(true, Ordering::Release);
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            log::warn!("graylog: connection worker panicked");
        }
        self.warner.flush(|count| {
            log::warn!(
                "graylog: dropped {count} messages for {}:{} before close",
                self.host,
                self.port
            );
        });
    }
}

impl Drop for GraylogConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for GraylogConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraylogConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("status", &self.connection_status())
            .field("queued", &self.queue_size())
            .finish()
    }
}
