//! Helpers shared by the integration tests.
#![allow(dead_code)]

pub mod gelf_server;
pub mod shared_buffer;

#[allow(unused_imports)]
pub use gelf_server::GelfServer;
#[allow(unused_imports)]
pub use shared_buffer::SharedBuf;
