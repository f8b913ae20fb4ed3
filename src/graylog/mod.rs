//! Graylog GELF-over-TCP handler implementation.
//!
//! [`GraylogHandler`] encodes each [`LogRecord`](crate::log_record::LogRecord)
//! as a GELF JSON document and hands it to a [`GraylogConnection`]. The
//! connection owns a bounded handoff queue and a worker thread that resolves
//! the server address, connects without blocking, detects peer closes and
//! writes NUL-terminated payloads in FIFO order, retrying after a fixed delay
//! whenever the network misbehaves.

mod config;
mod connection;
mod handler;
mod serialise;
mod state;
mod transport;
mod worker;


pub use config::{
    ConnectionConfig, DEFAULT_CONNECT_POLL_SLICE, DEFAULT_IDLE_SLICE, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RETRY_DELAY, DEFAULT_WRITE_BACKOFF, GraylogHandlerConfig, MAX_CONNECT_TRIES,
};
pub use connection::GraylogConnection;
pub use handler::GraylogHandler;
pub use serialise::{DELIMITER, GELF_VERSION, WirePayload, encode_record, frame_payload};
pub use state::ConnectionState;
pub use transport::{Resolve, SystemResolver};
