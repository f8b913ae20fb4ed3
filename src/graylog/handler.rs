//! Handler adapting log records to GELF payloads for a [`GraylogConnection`].

use crate::{
    handler::LogHandler, log_record::LogRecord, rate_limited_warner::RateLimitedWarner,
};

use super::{
    config::{ConnectionConfig, GraylogHandlerConfig},
    connection::GraylogConnection,
    serialise::encode_record,
    state::ConnectionState,
};

/// Handler forwarding records to a Graylog server as GELF over TCP.
pub struct GraylogHandler {
    connection: GraylogConnection,
    max_queue_length: usize,
    warner: RateLimitedWarner,
}

impl GraylogHandler {
    /// Connect to `host:port` with default settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(
            GraylogHandlerConfig::default().with_connection(ConnectionConfig::new(host, port)),
        )
    }

    pub fn with_config(config: GraylogHandlerConfig) -> Self {
        let warner = RateLimitedWarner::new(config.connection.warn_interval);
        Self {
            connection: GraylogConnection::new(config.connection),
            max_queue_length: config.max_queue_length,
            warner,
        }
    }

    /// Wrap an existing connection.
    pub fn from_connection(connection: GraylogConnection, config: &GraylogHandlerConfig) -> Self {
        Self {
            connection,
            max_queue_length: config.max_queue_length,
            warner: RateLimitedWarner::new(config.connection.warn_interval),
        }
    }

    pub fn connection_status(&self) -> ConnectionState {
        self.connection.connection_status()
    }

    /// Stop the connection worker. Later records are dropped.
    pub fn close(&self) {
        self.connection.close();
    }

    fn record_drop(&self, reason: &str) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            log::warn!("GraylogHandler dropped {count} records ({reason})");
        });
    }
}

impl LogHandler for GraylogHandler {
    fn add_message(&self, record: &LogRecord) {
        if self.connection.queue_size() >= self.max_queue_length {
            self.record_drop("queue full");
            return;
        }
        match encode_record(record) {
            Ok(payload) => self.connection.send(payload),
            Err(err) => {
                log::debug!("GraylogHandler: unable to encode record: {err}");
                self.record_drop("encoding failed");
            }
        }
    }

    fn empty_queue(&self) -> bool {
        self.connection.queue_empty()
    }

    fn queue_size(&self) -> usize {
        self.connection.queue_size()
    }

    fn flush(&self) -> bool {
        self.warner.flush(|count| {
            log::warn!("GraylogHandler dropped {count} records in the last interval");
        });
        true
    }
}

impl std::fmt::Debug for GraylogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraylogHandler")
            .field("connection", &self.connection)
            .field("max_queue_length", &self.max_queue_length)
            .finish()
    }
}
