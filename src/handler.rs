use crate::log_record::LogRecord;

/// Trait implemented by all log handlers.
///
/// Handlers are shared between producer threads, so implementations must be
/// `Send + Sync`. `add_message` must never block on I/O: each handler forwards
/// the record to its own consumer and drops it when that consumer is saturated.
pub trait LogHandler: Send + Sync {
    /// Accept a record for delivery. Records that cannot be queued are dropped.
    fn add_message(&self, record: &LogRecord);

    /// Whether the handler currently holds no undelivered messages.
    ///
    /// The value may change between two calls as other threads add messages
    /// and the consumer drains them.
    fn empty_queue(&self) -> bool {
        self.queue_size() == 0
    }

    /// Number of undelivered messages held by the handler.
    fn queue_size(&self) -> usize;

    /// Flush any buffered output. Returns `true` on success.
    fn flush(&self) -> bool {
        true
    }
}
