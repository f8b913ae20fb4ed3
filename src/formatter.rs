//! Text formatting for handlers that emit human-readable lines.

use std::{fmt, sync::Arc};

use crate::log_record::LogRecord;

/// Trait for formatting log records into strings.
///
/// Implemented for plain closures so callers can replace the default
/// message-to-string conversion without defining a type.
pub trait MessageFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> MessageFormatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Formats records as `SEVERITY: message`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl MessageFormatter for DefaultFormatter {
    fn format(&self, record: &LogRecord) -> String {
        format!("{}: {}", record.severity, record.message)
    }
}

/// Shared formatter trait object used by handler builders.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn MessageFormatter>,
}

impl SharedFormatter {
    pub fn new<F>(formatter: F) -> Self
    where
        F: MessageFormatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }
}

impl Default for SharedFormatter {
    fn default() -> Self {
        Self::new(DefaultFormatter)
    }
}

impl MessageFormatter for SharedFormatter {
    fn format(&self, record: &LogRecord) -> String {
        self.inner.format(record)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn MessageFormatter>)")
    }
}
