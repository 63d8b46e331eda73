//! The socket abstraction the connection core talks through.
//!
//! Grounded on `hdbconnect_impl/src/conn/tcp_client/sync_plain_tcp_client.rs`: a thin
//! wrapper around `TcpStream`. TLS is an explicit Non-goal here, so there is only the
//! one, plain variant. Unlike the teacher (which stores a concrete `TcpStream`), the
//! core is kept behind a small trait so that unit tests can substitute an in-memory
//! byte buffer for the socket without spinning up a broker.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// A bidirectional byte stream a session can be driven over.
///
/// `set_read_timeout` backs the `login_timeout`/`query_timeout` configuration options
/// (spec §5, §6): the session core calls it before each handshake step and each
/// data-plane roundtrip so a stalled broker surfaces as `CasError::Timeout` rather than
/// hanging forever.
pub trait CasTransport: Read + Write + std::fmt::Debug + Send {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl CasTransport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }
}

/// Opens a plain TCP connection to `addr`.
pub fn connect(addr: &str) -> std::io::Result<TcpStream> {
    TcpStream::connect(addr)
}
