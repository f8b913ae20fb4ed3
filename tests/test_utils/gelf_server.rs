//! In-process stand-in for a Graylog GELF TCP input.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts any number of connections and reports each NUL-terminated frame.
pub struct GelfServer {
    addr: SocketAddr,
    frames: mpsc::Receiver<Vec<u8>>,
    accepted: Arc<AtomicUsize>,
}

impl GelfServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        let addr = listener.local_addr().expect("listener has address");
        let (tx, frames) = mpsc::channel();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let tx = tx.clone();
                thread::spawn(move || read_frames(stream, tx));
            }
        });
        Self {
            addr,
            frames,
            accepted,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Wait for the next frame and parse it as JSON.
    pub fn recv_json(&self) -> serde_json::Value {
        let frame = self.frames.recv_timeout(RECV_TIMEOUT).expect("frame received");
        serde_json::from_slice(&frame).expect("frame is json")
    }

    /// Assert that no further frame arrives within `wait`.
    pub fn assert_silent(&self, wait: Duration) {
        assert!(
            self.frames.recv_timeout(wait).is_err(),
            "unexpected frame received"
        );
    }
}

fn read_frames(mut stream: TcpStream, tx: mpsc::Sender<Vec<u8>>) {
    let mut current = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        for &byte in &buf[..n] {
            if byte == 0 {
                if tx.send(std::mem::take(&mut current)).is_err() {
                    return;
                }
            } else {
                current.push(byte);
            }
        }
    }
}
