//! Configuration structures consumed by the Graylog connection and handler.
//!
//! `GraylogHandlerBuilder` constructs these values before passing them to
//! [`GraylogHandler`](super::GraylogHandler) for runtime use.

use std::time::Duration;

use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Default number of payloads the handoff queue can hold.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
/// Default fixed wait before retrying address resolution or connection.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
/// Default slice used while waiting for a non-blocking connect to finish.
pub const DEFAULT_CONNECT_POLL_SLICE: Duration = Duration::from_millis(50);
/// Default sleep slice for the retry wait states and queue peeks.
pub const DEFAULT_IDLE_SLICE: Duration = Duration::from_millis(50);
/// Default pause after a write would block.
pub const DEFAULT_WRITE_BACKOFF: Duration = Duration::from_millis(10);
/// Failed connection attempts tolerated before the address is resolved again.
pub const MAX_CONNECT_TRIES: u32 = 5;

/// Settings for a single [`GraylogConnection`](super::GraylogConnection).
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub queue_capacity: usize,
    pub retry_delay: Duration,
    pub connect_poll_slice: Duration,
    pub idle_slice: Duration,
    pub write_backoff: Duration,
    pub max_connect_tries: u32,
    /// Minimum spacing of the warnings about dropped payloads.
    pub warn_interval: Duration,
}

impl ConnectionConfig {
    /// Target `host:port` using the default timings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_warn_interval(mut self, interval: Duration) -> Self {
        self.warn_interval = interval;
        self
    }
}

/// Defaults point at a Graylog input on the local machine.
impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 12201,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retry_delay: DEFAULT_RETRY_DELAY,
            connect_poll_slice: DEFAULT_CONNECT_POLL_SLICE,
            idle_slice: DEFAULT_IDLE_SLICE,
            write_backoff: DEFAULT_WRITE_BACKOFF,
            max_connect_tries: MAX_CONNECT_TRIES,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

/// Configuration object describing how to construct a [`GraylogHandler`](super::GraylogHandler).
///
/// The handler's drop warnings share `connection.warn_interval` with the
/// connection's own queue-full warnings.
#[derive(Clone, Debug)]
pub struct GraylogHandlerConfig {
    pub connection: ConnectionConfig,
    /// Queue depth at which new records are dropped by the admission check.
    pub max_queue_length: usize,
}

impl Default for GraylogHandlerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            max_queue_length: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl GraylogHandlerConfig {
    /// Override the connection settings.
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }
}
