//! Front-end dispatcher handing records to registered handlers.
//!
//! A [`Logger`] filters messages by severity, stamps them with the process
//! defaults and any default fields, then passes the finished record to every
//! handler synchronously. Handlers are expected to queue the record and
//! return immediately.

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use parking_lot::RwLock;

use crate::{
    handler::LogHandler,
    level::Severity,
    log_record::{AdditionalField, Fields, LogRecord},
    process_info::ProcessInfo,
};

pub struct Logger {
    handlers: RwLock<Vec<Arc<dyn LogHandler>>>,
    min_severity: AtomicU8,
    default_fields: RwLock<Fields>,
    process: ProcessInfo,
}

impl Logger {
    /// Create a logger with no handlers and a minimum severity of
    /// [`Severity::Notice`].
    pub fn new() -> Self {
        Self::with_process_info(ProcessInfo::current().clone())
    }

    /// Create a logger that stamps records with `process` instead of the
    /// detected process information.
    pub fn with_process_info(process: ProcessInfo) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            min_severity: AtomicU8::new(Severity::default().into()),
            default_fields: RwLock::new(Fields::new()),
            process,
        }
    }

    pub fn add_handler(&self, handler: Arc<dyn LogHandler>) {
        self.handlers.write().push(handler);
    }

    pub fn remove_all_handlers(&self) {
        self.handlers.write().clear();
    }

    /// Snapshot of the registered handlers.
    pub fn handlers(&self) -> Vec<Arc<dyn LogHandler>> {
        self.handlers.read().clone()
    }

    /// Discard records less severe than `severity`.
    pub fn set_min_severity(&self, severity: Severity) {
        self.min_severity.store(severity.into(), Ordering::Relaxed);
    }

    pub fn min_severity(&self) -> Severity {
        Severity::try_from(self.min_severity.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Attach `value` under `key` to every subsequent record.
    pub fn add_field(&self, key: impl Into<String>, value: impl Into<AdditionalField>) {
        self.default_fields.write().insert(key, value);
    }

    /// Build a record carrying the process defaults and default fields.
    pub fn record(&self, severity: Severity, message: impl Into<String>) -> LogRecord {
        let mut record = LogRecord::new(severity, message).with_process_info(&self.process);
        record.fields.extend_from(&self.default_fields.read());
        record
    }

    /// Log `message` at `severity`. Returns `false` when filtered out.
    pub fn log(&self, severity: Severity, message: impl Into<String>) -> bool {
        self.log_with_fields(severity, message, std::iter::empty::<(String, AdditionalField)>())
    }

    pub fn log_with_field<K, V>(
        &self,
        severity: Severity,
        message: impl Into<String>,
        field: (K, V),
    ) -> bool
    where
        K: Into<String>,
        V: Into<AdditionalField>,
    {
        self.log_with_fields(severity, message, std::iter::once(field))
    }

    /// Log `message` with extra fields overriding any defaults of the same
    /// name.
    pub fn log_with_fields<I, K, V>(
        &self,
        severity: Severity,
        message: impl Into<String>,
        fields: I,
    ) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AdditionalField>,
    {
        if !severity.is_enabled_for(self.min_severity()) {
            return false;
        }
        let mut record = self.record(severity, message);
        for (key, value) in fields {
            record.add_field(key, value);
        }
        self.dispatch(&record);
        true
    }

    fn dispatch(&self, record: &LogRecord) {
        for handler in self.handlers.read().iter() {
            handler.add_message(record);
        }
    }

    /// Flush every handler. Returns `true` only if all of them succeeded.
    pub fn flush(&self) -> bool {
        self.handlers()
            .iter()
            .fold(true, |ok, handler| handler.flush() && ok)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("handlers", &self.handlers.read().len())
            .field("min_severity", &self.min_severity())
            .field("process", &self.process)
            .finish()
    }
}
