//! Handler builders and associated traits.
//!
//! Provides a minimal builder API for constructing handlers in a
//! type-safe manner. Each builder implements [`HandlerBuilderTrait`]
//! which returns a shared [`LogHandler`] ready for registration with a
//! [`Logger`](crate::logger::Logger).

use std::{io, sync::Arc};

use thiserror::Error;

use crate::handler::LogHandler;

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err($crate::handlers::HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

pub(crate) use ensure_positive;

pub mod graylog_builder;
pub mod stream_builder;

pub use graylog_builder::GraylogHandlerBuilder;
pub use stream_builder::StreamHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the handler.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    /// Concrete handler produced by this builder.
    type Handler: LogHandler + 'static;

    /// Validate the configuration and build the concrete handler.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;

    /// Build the handler as a shared trait object.
    fn build(&self) -> Result<Arc<dyn LogHandler>, HandlerBuildError> {
        Ok(Arc::new(self.build_inner()?))
    }
}
