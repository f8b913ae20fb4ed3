//! Non-blocking log shipping to Graylog.
//!
//! Records are created by a [`Logger`], filtered by [`Severity`] and handed to
//! every registered [`LogHandler`]. The [`GraylogHandler`] encodes them as
//! GELF JSON and queues them for a background worker that keeps a TCP
//! connection to the server alive; producers never wait on the network.

pub mod file_config;
pub mod formatter;
pub mod graylog;
pub mod handler;
pub mod handlers;
pub mod handoff_queue;
pub mod level;
pub mod log_record;
pub mod logger;
pub mod process_info;
pub mod rate_limited_warner;
pub mod stream_handler;

#[cfg(test)]
mod test_utils;

pub use file_config::{ConfigError, LoggingConfig};
pub use formatter::{DefaultFormatter, MessageFormatter, SharedFormatter};
pub use graylog::{
    ConnectionConfig, ConnectionState, GraylogConnection, GraylogHandler, GraylogHandlerConfig,
    Resolve, SystemResolver, WirePayload, encode_record, frame_payload,
};
pub use handler::LogHandler;
pub use handlers::{
    GraylogHandlerBuilder, HandlerBuildError, HandlerBuilderTrait, StreamHandlerBuilder,
};
pub use handoff_queue::{HandoffQueue, QueueFull};
pub use level::{ParseSeverityError, Severity};
pub use log_record::{AdditionalField, Fields, LogRecord};
pub use logger::Logger;
pub use process_info::ProcessInfo;
pub use rate_limited_warner::RateLimitedWarner;
pub use stream_handler::StreamHandler;
