use crate::base64::Base64Error;
use std::io;
use thiserror::Error;

/// Error type for remote calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Nothing is listening on the endpoint
    #[error("connection refused")]
    ConnectionRefused,
    /// Any other transport failure
    #[error("i/o error: {0}")]
    Io(io::ErrorKind),
    /// The server answered with an error status and no error code
    #[error("server returned status {0}")]
    Status(u16),
    /// The server reported an error code such as `ENOENT`
    #[error("remote error: {0}")]
    Remote(String),
    /// The response could not be decoded
    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),
    /// The file data was not valid base64
    #[error("invalid file data: {0}")]
    Base64(#[from] Base64Error),
    /// The server URL could not be parsed
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
}

impl RemoteError {
    /// Whether the remote side reported that the path doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(code) if code == "ENOENT")
    }
}

impl From<io::Error> for RemoteError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            kind => Self::Io(kind),
        }
    }
}
