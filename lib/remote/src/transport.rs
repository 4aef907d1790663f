use crate::{Endpoint, RemoteError, Result};
use std::fmt;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Largest response accepted from the remote store.
pub const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;

/// Moves one encoded request to the remote store and returns the raw
/// response.
pub trait Transport: fmt::Debug + Send + Sync {
    fn round_trip(&self, endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>>;
}

/// A fresh TCP connection per request, read until the peer closes.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Option<Duration>,
    max_response_size: usize,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Bound connecting, sending and receiving. Without a timeout a
    /// stalled server blocks the caller indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }

    fn connect(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let Some(timeout) = self.timeout else {
            return Ok(TcpStream::connect((endpoint.host.as_str(), endpoint.port))?);
        };

        let mut last_error = RemoteError::Endpoint(format!("{endpoint} did not resolve"));
        for addr in (endpoint.host.as_str(), endpoint.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_error = err.into(),
            }
        }
        Err(last_error)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    fn round_trip(&self, endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>> {
        let mut stream = self.connect(endpoint)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        stream.write_all(request)?;
        stream.flush()?;

        let mut response = Vec::new();
        stream
            .take(self.max_response_size as u64 + 1)
            .read_to_end(&mut response)?;
        if response.len() > self.max_response_size {
            return Err(RemoteError::MalformedResponse("response too large"));
        }

        tracing::trace!(%endpoint, sent = request.len(), received = response.len(), "round trip");
        Ok(response)
    }
}
