//! Connection states and the atomic cell publishing them to other threads.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Current phase of the connection worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Worker not running (before start or after shutdown).
    Idle = 0,
    ResolvingAddress = 1,
    AddressRetryWait = 2,
    Connecting = 3,
    ConnectWait = 4,
    ConnectRetryRebind = 5,
    /// Connected and waiting for the next payload.
    Ready = 6,
    Sending = 7,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::ResolvingAddress,
            2 => Self::AddressRetryWait,
            3 => Self::Connecting,
            4 => Self::ConnectWait,
            5 => Self::ConnectRetryRebind,
            6 => Self::Ready,
            7 => Self::Sending,
            _ => Self::Idle,
        }
    }

    /// Whether a socket is established in this state.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Ready | Self::Sending)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ResolvingAddress => "resolving address",
            Self::AddressRetryWait => "address retry wait",
            Self::Connecting => "connecting",
            Self::ConnectWait => "connect wait",
            Self::ConnectRetryRebind => "connect retry wait",
            Self::Ready => "ready",
            Self::Sending => "sending",
        };
        f.write_str(s)
    }
}

/// Lock-free snapshot of a [`ConnectionState`].
#[derive(Debug)]
pub(crate) struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ConnectionState::Idle)]
    #[case(ConnectionState::AddressRetryWait)]
    #[case(ConnectionState::ConnectRetryRebind)]
    #[case(ConnectionState::Sending)]
    fn atomic_cell_reports_stored_state(#[case] state: ConnectionState) {
        let cell = AtomicConnectionState::new(ConnectionState::Idle);
        cell.store(state);
        assert_eq!(cell.load(), state);
    }

    #[test]
    fn only_ready_and_sending_are_connected() {
        assert!(ConnectionState::Ready.is_connected());
        assert!(ConnectionState::Sending.is_connected());
        assert!(!ConnectionState::ConnectWait.is_connected());
    }
}
