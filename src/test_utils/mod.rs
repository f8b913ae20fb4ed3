//! Test-only helpers shared across crate unit tests.

pub mod collecting_handler;

/// Starts the global `logtest` logger once per test binary.
///
/// `logtest::Logger::start` panics if a logger is already installed, so tests
/// that capture log output share a single installation.
pub fn capture_logs() -> logtest::Logger {
    static START: std::sync::Once = std::sync::Once::new();
    let mut started = None;
    START.call_once(|| started = Some(logtest::Logger::start()));
    let mut logger = started.unwrap_or(logtest::Logger);
    // Discard records left over from earlier tests.
    while logger.pop().is_some() {}
    logger
}
