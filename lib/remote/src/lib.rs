//! Client for the vtfs remote store protocol.
//!
//! Requests are plain HTTP/1.1 `GET`s carrying the operation in the
//! path and its arguments in the query string; responses are a minimal
//! JSON envelope, `{"result": ...}` or `{"error": "<ERRNO>"}`. The
//! codecs are hand-written and have no dependencies.

pub mod base64;
mod client;
mod endpoint;
mod error;
pub mod http;
pub mod json;
pub mod percent;
mod transport;

pub use client::{EntryKind, RemoteClient, RemoteEntry, RemoteStat};
pub use endpoint::{Endpoint, DEFAULT_HOST, DEFAULT_PORT};
pub use error::RemoteError;
pub use transport::{TcpTransport, Transport, MAX_RESPONSE_SIZE};

pub type Result<T, E = RemoteError> = std::result::Result<T, E>;
