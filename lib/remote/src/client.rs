use crate::http::{self, Operation};
use crate::{base64, json, Endpoint, RemoteError, Result, TcpTransport, Transport};
use std::sync::Arc;

const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

/// Entry type as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
        }
    }

    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "file" => Some(Self::File),
            "dir" => Some(Self::Dir),
            _ => None,
        }
    }

    /// `st_mode` the client reports for this type.
    pub fn mode(&self) -> u32 {
        let ty = match self {
            Self::File => S_IFREG,
            Self::Dir => S_IFDIR,
        };
        ty | 0o777
    }
}

/// What `stat` reports about a remote path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStat {
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
}

/// One item of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub ino: u64,
    pub kind: EntryKind,
    pub mode: u32,
    pub size: u64,
}

/// Synchronous client for the remote store.
///
/// Every call opens its own connection; nothing is retried.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    endpoint: Endpoint,
    token: String,
    transport: Arc<dyn Transport>,
}

impl RemoteClient {
    pub fn new(endpoint: Endpoint, token: impl Into<String>) -> Self {
        Self::with_transport(endpoint, token, Arc::new(TcpTransport::new()))
    }

    pub fn with_transport(
        endpoint: Endpoint,
        token: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint,
            token: token.into(),
            transport,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one request and return the body of a successful response.
    fn call(&self, operation: Operation, args: &[(&str, &str)]) -> Result<String> {
        let request = http::encode_request(&self.endpoint, operation, &self.token, args);
        let raw = self.transport.round_trip(&self.endpoint, &request)?;
        let response = http::parse_response(&raw)?;
        let body = String::from_utf8(response.body)
            .map_err(|_| RemoteError::MalformedResponse("body is not UTF-8"))?;

        if json::has_top_level_field(&body, "error") {
            let code = json::string_field(&body, "error").unwrap_or("EIO");
            return Err(RemoteError::Remote(code.to_string()));
        }
        if response.status >= 400 {
            return Err(RemoteError::Status(response.status));
        }

        Ok(body)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn create(&self, path: &str, kind: EntryKind, mode: u32) -> Result<()> {
        let mode = format!("{:o}", mode & 0o7777);
        self.call(
            Operation::Create,
            &[("path", path), ("type", kind.as_str()), ("mode", &mode)],
        )?;
        Ok(())
    }

    /// Read up to `buf.len()` bytes at `offset`. Extra bytes sent by the
    /// server are dropped.
    #[tracing::instrument(level = "debug", skip(self, buf), fields(len = buf.len()))]
    pub fn read(&self, path: &str, buf: &mut [u8], offset: u64) -> Result<usize> {
        let offset = offset.to_string();
        let size = buf.len().to_string();
        let body = self.call(
            Operation::Read,
            &[("path", path), ("offset", &offset), ("size", &size)],
        )?;

        let result = json::object_field(&body, "result")
            .ok_or(RemoteError::MalformedResponse("missing result"))?;
        let data = json::string_field(result, "data")
            .ok_or(RemoteError::MalformedResponse("missing data"))?;
        let data = base64::decode(data)?;

        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    /// Write `data` at `offset`, returning how many bytes the server
    /// reports as written.
    #[tracing::instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn write(&self, path: &str, data: &[u8], offset: u64) -> Result<usize> {
        let offset = offset.to_string();
        let data_b64 = base64::encode(data);
        let body = self.call(
            Operation::Write,
            &[("path", path), ("offset", &offset), ("data", &data_b64)],
        )?;
        Ok(json::number_field(&body, "written").unwrap_or(data.len()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn delete(&self, path: &str) -> Result<()> {
        self.call(Operation::Delete, &[("path", path)])?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn stat(&self, path: &str) -> Result<RemoteStat> {
        let body = self.call(Operation::Stat, &[("path", path)])?;
        let result = json::object_field(&body, "result")
            .ok_or(RemoteError::MalformedResponse("missing result"))?;

        let kind = json::string_field(result, "type")
            .and_then(EntryKind::from_wire)
            .ok_or(RemoteError::MalformedResponse("missing or unknown type"))?;
        let size = json::number_field(result, "size")
            .ok_or(RemoteError::MalformedResponse("missing size"))?;

        Ok(RemoteStat {
            kind,
            mode: kind.mode(),
            size,
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn list(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let body = self.call(Operation::List, &[("path", path)])?;
        let objects = json::array_objects(&body, "result")
            .ok_or(RemoteError::MalformedResponse("missing result"))?;

        objects
            .into_iter()
            .map(|object| {
                let kind = json::string_field(object, "type")
                    .and_then(EntryKind::from_wire)
                    .ok_or(RemoteError::MalformedResponse("missing or unknown type"))?;
                let perm: u32 = json::number_field(object, "mode").unwrap_or(0o777);
                Ok(RemoteEntry {
                    name: json::string_field(object, "name")
                        .ok_or(RemoteError::MalformedResponse("missing name"))?
                        .to_string(),
                    ino: json::number_field(object, "ino").unwrap_or(0),
                    kind,
                    mode: (kind.mode() & !0o777) | (perm & 0o7777),
                    size: json::number_field(object, "size").unwrap_or(0),
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn link(&self, old_path: &str, new_path: &str) -> Result<()> {
        self.call(
            Operation::Link,
            &[("oldpath", old_path), ("newpath", new_path)],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Answers every request with the same response and records what
    /// was sent.
    #[derive(Debug, Default)]
    struct Canned {
        response: Vec<u8>,
        requests: Mutex<Vec<String>>,
    }

    impl Canned {
        fn json(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: format!("HTTP/1.1 {status} X\r\nContent-Type: application/json\r\n\r\n{body}")
                    .into_bytes(),
                requests: Mutex::default(),
            })
        }

        fn request_line(&self, nth: usize) -> String {
            let requests = self.requests.lock().unwrap();
            requests[nth].lines().next().unwrap().to_string()
        }
    }

    impl Transport for Canned {
        fn round_trip(&self, _endpoint: &Endpoint, request: &[u8]) -> Result<Vec<u8>> {
            self.requests
                .lock()
                .unwrap()
                .push(String::from_utf8(request.to_vec()).unwrap());
            Ok(self.response.clone())
        }
    }

    fn client(transport: Arc<Canned>) -> RemoteClient {
        RemoteClient::with_transport(Endpoint::default(), "tok en", transport)
    }

    #[test]
    fn stat_reports_type_and_size() {
        let transport = Canned::json(200, r#"{"result":{"ino":1001,"type":"file","size":42}}"#);
        let stat = client(transport.clone()).stat("/a").unwrap();

        assert_eq!(
            stat,
            RemoteStat {
                kind: EntryKind::File,
                mode: 0o100777,
                size: 42
            }
        );
        assert_eq!(
            transport.request_line(0),
            "GET /stat?token=tok%20en&path=%2Fa HTTP/1.1"
        );
    }

    #[test]
    fn stat_of_a_directory() {
        let transport = Canned::json(200, r#"{"result":{"type":"dir","size":0,"mode":493}}"#);
        let stat = client(transport).stat("/d").unwrap();
        assert_eq!(stat.kind, EntryKind::Dir);
        assert_eq!(stat.mode, 0o040777);
    }

    #[test]
    fn error_envelope_becomes_remote_error() {
        let transport = Canned::json(400, r#"{"error":"ENOENT"}"#);
        let err = client(transport).stat("/missing").unwrap_err();
        assert_eq!(err, RemoteError::Remote("ENOENT".to_string()));
        assert!(err.is_not_found());
    }

    #[test]
    fn error_field_wins_over_success_status() {
        let transport = Canned::json(200, r#"{"error":"EEXIST"}"#);
        assert_eq!(
            client(transport).create("/a", EntryKind::File, 0o644),
            Err(RemoteError::Remote("EEXIST".to_string()))
        );
    }

    #[test]
    fn bare_error_status() {
        let transport = Canned::json(503, "unavailable");
        assert_eq!(
            client(transport).delete("/a"),
            Err(RemoteError::Status(503))
        );
    }

    #[test]
    fn create_sends_octal_mode() {
        let transport = Canned::json(200, r#"{"result":{"ino":1001,"path":"/d"}}"#);
        client(transport.clone())
            .create("/d", EntryKind::Dir, 0o040755)
            .unwrap();
        assert_eq!(
            transport.request_line(0),
            "GET /create?token=tok%20en&path=%2Fd&type=dir&mode=755 HTTP/1.1"
        );
    }

    #[test]
    fn read_decodes_and_truncates() {
        let transport = Canned::json(200, r#"{"result":{"data":"aGVsbG8gd29ybGQ="}}"#);
        let client = client(transport.clone());

        let mut buf = [0; 5];
        assert_eq!(client.read("/a", &mut buf, 3), Ok(5));
        assert_eq!(&buf, b"hello");
        assert_eq!(
            transport.request_line(0),
            "GET /read?token=tok%20en&path=%2Fa&offset=3&size=5 HTTP/1.1"
        );
    }

    #[test]
    fn read_rejects_bad_payloads() {
        let mut buf = [0; 8];

        let transport = Canned::json(200, r#"{"result":{"data":"not base64!"}}"#);
        assert!(matches!(
            client(transport).read("/a", &mut buf, 0),
            Err(RemoteError::Base64(_))
        ));

        let transport = Canned::json(200, r#"{"result":{}}"#);
        assert_eq!(
            client(transport).read("/a", &mut buf, 0),
            Err(RemoteError::MalformedResponse("missing data"))
        );
    }

    #[test]
    fn write_sends_base64() {
        let transport = Canned::json(200, r#"{"result":{"written":3}}"#);
        assert_eq!(client(transport.clone()).write("/a", b"foo", 10), Ok(3));
        assert_eq!(
            transport.request_line(0),
            "GET /write?token=tok%20en&path=%2Fa&offset=10&data=Zm9v HTTP/1.1"
        );
    }

    #[test]
    fn list_entries() {
        let transport = Canned::json(
            200,
            r#"{"result":[{"name":"a","ino":1001,"type":"file","mode":420,"size":3},{"name":"d","ino":1002,"type":"dir","mode":493,"size":0}]}"#,
        );
        let entries = client(transport).list("/").unwrap();
        assert_eq!(
            entries,
            [
                RemoteEntry {
                    name: "a".to_string(),
                    ino: 1001,
                    kind: EntryKind::File,
                    mode: 0o100644,
                    size: 3,
                },
                RemoteEntry {
                    name: "d".to_string(),
                    ino: 1002,
                    kind: EntryKind::Dir,
                    mode: 0o040755,
                    size: 0,
                },
            ]
        );
    }

    #[test]
    fn link_sends_both_paths() {
        let transport = Canned::json(200, r#"{"result":{"linked":true}}"#);
        client(transport.clone()).link("/a", "/b").unwrap();
        assert_eq!(
            transport.request_line(0),
            "GET /link?token=tok%20en&oldpath=%2Fa&newpath=%2Fb HTTP/1.1"
        );
    }
}
