//! A simple handler that accumulates records in memory for test assertions.
//!
//! This module is shared across multiple test modules so that each one does
//! not need its own copy of the same boilerplate.

use crate::handler::LogHandler;
use crate::log_record::LogRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Handler that stores every record it receives for later inspection.
#[derive(Clone, Default)]
pub struct CollectingHandler {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl CollectingHandler {
    /// Create a new empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a snapshot of all records received so far.
    pub fn collected(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages of the collected records in arrival order.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }
}

impl LogHandler for CollectingHandler {
    fn add_message(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }

    fn queue_size(&self) -> usize {
        0
    }
}
