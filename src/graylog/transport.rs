//! Transport primitives for the Graylog connection worker.
//!
//! Every operation here is non-blocking or bounded by a caller supplied slice
//! so the worker can keep checking its shutdown flag.

use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    thread,
    time::{Duration, Instant},
};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Interval between socket checks while a connect is in progress.
const CONNECT_PROBE_INTERVAL: Duration = Duration::from_millis(5);
/// Upper bound on reads performed by a single peer probe.
const MAX_PROBE_READS: usize = 16;

/// Resolves the target host into candidate socket addresses.
pub trait Resolve: Send + 'static {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// Resolver backed by the platform's `getaddrinfo`, restricted to IPv4.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()?
            .filter(SocketAddr::is_ipv4)
            .collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no IPv4 address found for {host}:{port}"),
            ));
        }
        Ok(addrs)
    }
}

impl<F> Resolve for F
where
    F: Fn(&str, u16) -> io::Result<Vec<SocketAddr>> + Send + 'static,
{
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        self(host, port)
    }
}

fn connect_in_progress(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EINPROGRESS)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

/// Outcome of waiting on a [`PendingConnection`].
pub(crate) enum ConnectProgress {
    Pending(PendingConnection),
    Connected(Connection),
    Failed(io::Error),
}

/// A socket whose non-blocking connect has been issued but not confirmed.
pub(crate) struct PendingConnection {
    socket: Socket,
    addr: SocketAddr,
}

impl PendingConnection {
    /// Open a non-blocking socket and start connecting it to `addr`.
    ///
    /// Both an in-progress connect and an immediately completed one yield a
    /// pending connection; [`PendingConnection::poll`] reports which.
    pub(crate) fn start(addr: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        #[cfg(target_vendor = "apple")]
        socket.set_nosigpipe(true)?;
        match socket.connect(&SockAddr::from(addr)) {
            Ok(()) => {}
            Err(err) if connect_in_progress(&err) => {}
            Err(err) => return Err(err),
        }
        Ok(Self { socket, addr })
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Check the connect outcome for at most `slice`.
    pub(crate) fn poll(self, slice: Duration) -> ConnectProgress {
        let until = Instant::now() + slice;
        loop {
            match self.check() {
                Ok(true) => return ConnectProgress::Connected(Connection::established(self)),
                Ok(false) => {}
                Err(err) => return ConnectProgress::Failed(err),
            }
            let now = Instant::now();
            if now >= until {
                return ConnectProgress::Pending(self);
            }
            thread::sleep(CONNECT_PROBE_INTERVAL.min(until - now));
        }
    }

    fn check(&self) -> io::Result<bool> {
        if let Some(err) = self.socket.take_error()? {
            return Err(err);
        }
        match self.socket.peer_addr() {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// State of the remote end as seen by a non-blocking probe.
#[derive(Debug)]
pub(crate) enum PeerStatus {
    Open,
    Closed,
    Failed(io::Error),
}

/// An established, non-blocking TCP connection.
pub(crate) struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    fn established(pending: PendingConnection) -> Self {
        let stream = TcpStream::from(pending.socket);
        if let Err(err) = stream.set_nodelay(true) {
            log::debug!("graylog: unable to set TCP_NODELAY: {err}");
        }
        Self {
            stream,
            peer: pending.addr,
        }
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Detect a peer-initiated close without blocking.
    ///
    /// Graylog never writes to a GELF TCP input, so any inbound bytes are
    /// read and discarded.
    pub(crate) fn probe(&mut self) -> PeerStatus {
        let mut buf = [0u8; 512];
        for _ in 0..MAX_PROBE_READS {
            match self.stream.read(&mut buf) {
                Ok(0) => return PeerStatus::Closed,
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return PeerStatus::Open,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return PeerStatus::Failed(err),
            }
        }
        PeerStatus::Open
    }

    /// Write as much of `buf` as the socket accepts right now.
    pub(crate) fn write_some(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    /// Shut down both directions and release the socket.
    pub(crate) fn close(self) {
        if let Err(err) = self.stream.shutdown(Shutdown::Both) {
            log::debug!("graylog: shutdown of connection to {} failed: {err}", self.peer);
        }
    }
}
