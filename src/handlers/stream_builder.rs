//! Builder for [`StreamHandler`].
//!
//! Allows configuration of stream based handlers writing to `stdout` or
//! `stderr`, with an optional formatter and channel capacity.

use std::io;

use crate::{
    formatter::{MessageFormatter, SharedFormatter},
    stream_handler::{DEFAULT_CHANNEL_CAPACITY, StreamHandler},
};

use super::{HandlerBuildError, HandlerBuilderTrait, ensure_positive};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamTarget {
    Stdout,
    Stderr,
}

/// Builder for constructing [`StreamHandler`] instances.
#[derive(Clone, Debug)]
pub struct StreamHandlerBuilder {
    target: StreamTarget,
    capacity: Option<usize>,
    formatter: SharedFormatter,
}

impl StreamHandlerBuilder {
    fn with_target(target: StreamTarget) -> Self {
        Self {
            target,
            capacity: None,
            formatter: SharedFormatter::default(),
        }
    }

    /// Create a builder targeting `stdout`.
    pub fn stdout() -> Self {
        Self::with_target(StreamTarget::Stdout)
    }

    /// Create a builder targeting `stderr`.
    pub fn stderr() -> Self {
        Self::with_target(StreamTarget::Stderr)
    }

    pub fn target(&self) -> StreamTarget {
        self.target
    }

    /// Set the bounded channel capacity.
    ///
    /// The capacity must be greater than zero; invalid values cause `build`
    /// to error.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Replace the default `SEVERITY: message` formatter.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: MessageFormatter + 'static,
    {
        self.formatter = SharedFormatter::new(formatter);
        self
    }

    fn validate(&self) -> Result<usize, HandlerBuildError> {
        match self.capacity {
            Some(capacity) => ensure_positive!(capacity, "capacity"),
            None => Ok(DEFAULT_CHANNEL_CAPACITY),
        }
    }
}

impl HandlerBuilderTrait for StreamHandlerBuilder {
    type Handler = StreamHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let capacity = self.validate()?;
        let formatter = self.formatter.clone();
        Ok(match self.target {
            StreamTarget::Stdout => StreamHandler::with_capacity(io::stdout(), formatter, capacity),
            StreamTarget::Stderr => StreamHandler::with_capacity(io::stderr(), formatter, capacity),
        })
    }
}
