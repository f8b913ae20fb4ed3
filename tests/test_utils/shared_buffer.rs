//! Thread-safe byte buffer for capturing stream handler output.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

/// Cloneable writer whose clones all append to the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    /// Return the buffer contents decoded as UTF-8.
    pub fn text(&self) -> String {
        let bytes = self.buffer.lock().expect("SharedBuf mutex poisoned").clone();
        String::from_utf8(bytes).expect("stream output is utf8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
