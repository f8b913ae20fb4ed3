//! Builder for [`GraylogHandler`](crate::graylog::GraylogHandler).
//!
//! Exposes the server address, queue sizing and the fixed retry delay used by
//! the connection worker.

use std::time::Duration;

use crate::graylog::{ConnectionConfig, GraylogHandler, GraylogHandlerConfig};

use super::{HandlerBuildError, HandlerBuilderTrait, ensure_positive};

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`GraylogHandler`] instances.
#[derive(Clone, Debug, Default)]
pub struct GraylogHandlerBuilder {
    host: Option<String>,
    port: Option<u16>,
    queue_capacity: Option<usize>,
    max_queue_length: Option<usize>,
    retry_delay_ms: Option<u64>,
}

impl GraylogHandlerBuilder {
    /// Create a new builder with no server configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Graylog host name or address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Set the GELF TCP input port."]
        with_port,
        port,
        u16
    );
    option_setter!(
        #[doc = "Set the number of payloads the connection queue can hold."]
        with_queue_capacity,
        queue_capacity,
        usize
    );
    option_setter!(
        #[doc = "Set the queue depth at which new records are dropped."]
        with_max_queue_length,
        max_queue_length,
        usize
    );
    option_setter!(
        #[doc = "Set the delay before retrying resolution or connection."]
        with_retry_delay_ms,
        retry_delay_ms,
        u64
    );

    fn validate(&self) -> Result<(), HandlerBuildError> {
        match self.host.as_deref() {
            None => {
                return Err(HandlerBuildError::InvalidConfig(
                    "graylog handler requires a host".into(),
                ));
            }
            Some(host) if host.trim().is_empty() => {
                return Err(HandlerBuildError::InvalidConfig(
                    "host must not be empty".into(),
                ));
            }
            Some(_) => {}
        }
        if let Some(port) = self.port {
            ensure_positive!(port, "port")?;
        }
        if let Some(capacity) = self.queue_capacity {
            ensure_positive!(capacity, "queue_capacity")?;
        }
        if let Some(length) = self.max_queue_length {
            ensure_positive!(length, "max_queue_length")?;
        }
        if let Some(delay) = self.retry_delay_ms {
            ensure_positive!(delay, "retry_delay_ms")?;
        }
        Ok(())
    }

    /// Validate the builder and produce the handler configuration.
    pub fn build_config(&self) -> Result<GraylogHandlerConfig, HandlerBuildError> {
        self.validate()?;
        let mut connection = ConnectionConfig::default();
        if let Some(host) = &self.host {
            connection.host = host.trim().to_owned();
        }
        if let Some(port) = self.port {
            connection.port = port;
        }
        if let Some(capacity) = self.queue_capacity {
            connection.queue_capacity = capacity;
        }
        if let Some(delay) = self.retry_delay_ms {
            connection.retry_delay = Duration::from_millis(delay);
        }
        let mut config = GraylogHandlerConfig::default().with_connection(connection);
        if let Some(length) = self.max_queue_length {
            config.max_queue_length = length;
        }
        Ok(config)
    }
}

impl HandlerBuilderTrait for GraylogHandlerBuilder {
    type Handler = GraylogHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        Ok(GraylogHandler::with_config(self.build_config()?))
    }
}
