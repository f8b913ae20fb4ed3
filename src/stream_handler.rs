//! Stream-based logging handler implementation.
//!
//! This module defines `StreamHandler`, which formats log records and writes
//! them to a stream on a background thread. The handler forwards records over
//! a bounded channel so the producer never blocks on I/O.

use std::{
    io::{self, Write},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::warn;
use parking_lot::Mutex;

use crate::{
    formatter::{DefaultFormatter, MessageFormatter},
    handler::LogHandler,
    log_record::LogRecord,
    rate_limited_warner::RateLimitedWarner,
};

/// Default bounded channel capacity for stream handlers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

enum StreamCommand {
    Record(Box<LogRecord>),
    Flush(Sender<()>),
}

/// Handler that writes formatted log records to an `io::Write` stream.
///
/// Each instance owns a background thread which receives records via a
/// channel and writes them to the provided stream. The writer and formatter
/// are moved into that thread so the caller never locks or blocks.
pub struct StreamHandler {
    tx: Option<Sender<StreamCommand>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    done_rx: Receiver<()>,
    warner: RateLimitedWarner,
}

impl StreamHandler {
    /// Create a new handler writing to `stdout` with a `DefaultFormatter`.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DefaultFormatter)
    }

    /// Create a new handler writing to `stderr` with a `DefaultFormatter`.
    pub fn stderr() -> Self {
        Self::new(io::stderr(), DefaultFormatter)
    }

    /// Create a new handler from an arbitrary writer and formatter using the default capacity.
    pub fn new<W, F>(writer: W, formatter: F) -> Self
    where
        W: Write + Send + 'static,
        F: MessageFormatter + 'static,
    {
        Self::with_capacity(writer, formatter, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new handler with a custom channel capacity.
    pub fn with_capacity<W, F>(writer: W, formatter: F, capacity: usize) -> Self
    where
        W: Write + Send + 'static,
        F: MessageFormatter + 'static,
    {
        let (tx, rx) = bounded(capacity.max(1));
        let (done_tx, done_rx) = bounded(1);
        let handle = thread::spawn(move || {
            let mut writer = writer;
            for command in rx {
                match command {
                    StreamCommand::Record(record) => {
                        let msg = formatter.format(&record);
                        if writeln!(writer, "{msg}")
                            .and_then(|_| writer.flush())
                            .is_err()
                        {
                            warn!("StreamHandler write error");
                        }
                    }
                    StreamCommand::Flush(ack) => {
                        if writer.flush().is_err() {
                            warn!("StreamHandler flush error");
                        }
                        let _ = ack.send(());
                    }
                }
            }
            let _ = done_tx.send(());
        });

        Self {
            tx: Some(tx),
            handle: Mutex::new(Some(handle)),
            done_rx,
            warner: RateLimitedWarner::default(),
        }
    }
}

impl LogHandler for StreamHandler {
    fn add_message(&self, record: &LogRecord) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        if tx
            .try_send(StreamCommand::Record(Box::new(record.clone())))
            .is_err()
        {
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                warn!("StreamHandler: queue full or shutting down, dropped {count} records");
            });
        }
    }

    fn queue_size(&self) -> usize {
        self.tx.as_ref().map_or(0, Sender::len)
    }

    fn flush(&self) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if tx.send_timeout(StreamCommand::Flush(ack_tx), FLUSH_TIMEOUT).is_err() {
            return false;
        }
        ack_rx.recv_timeout(FLUSH_TIMEOUT).is_ok()
    }
}

impl Drop for StreamHandler {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.lock().take() {
            if self.done_rx.recv_timeout(SHUTDOWN_TIMEOUT).is_err() {
                warn!("StreamHandler: worker thread did not shut down within 1s");
                return;
            }
            if handle.join().is_err() {
                warn!("StreamHandler: worker thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandler")
            .field("queued", &self.queue_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Severity;
    use rstest::rstest;
    use serial_test::serial;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).expect("utf8 output")
        }
    }

    #[rstest]
    fn writes_formatted_lines() {
        let buf = SharedBuf::default();
        {
            let handler = StreamHandler::new(buf.clone(), DefaultFormatter);
            handler.add_message(&LogRecord::new(Severity::Warning, "disk almost full"));
            handler.add_message(&LogRecord::new(Severity::Informational, "done"));
            assert!(handler.flush());
        }
        assert_eq!(buf.contents(), "WARNING: disk almost full\nINFO: done\n");
    }

    #[rstest]
    fn uses_custom_formatter() {
        let buf = SharedBuf::default();
        let handler = StreamHandler::new(buf.clone(), |record: &LogRecord| {
            format!("[{}] {}", record.severity as u8, record.message)
        });
        handler.add_message(&LogRecord::new(Severity::Error, "boom"));
        assert!(handler.flush());
        assert_eq!(buf.contents(), "[3] boom\n");
        assert!(handler.empty_queue());
    }

    struct BlockingWriter(crossbeam_channel::Receiver<()>);

    impl Write for BlockingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    #[serial]
    fn full_channel_drops_and_warns() {
        let mut logger = crate::test_utils::capture_logs();
        let (release_tx, release_rx) = bounded(0);
        let handler =
            StreamHandler::with_capacity(BlockingWriter(release_rx), DefaultFormatter, 1);
        for i in 0..4 {
            handler.add_message(&LogRecord::new(Severity::Error, format!("msg {i}")));
        }
        drop(release_tx);

        let mut found = false;
        while let Some(record) = logger.pop() {
            if record.level() == log::Level::Warn && record.args().contains("StreamHandler") {
                found = true;
            }
        }
        assert!(found, "expected a drop warning");
    }
}
