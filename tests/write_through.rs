//! Facade behavior against a scripted remote.

use pretty_assertions::assert_eq;
use std::fmt;
use std::sync::{Arc, Mutex};
use vtfs::remote::{Endpoint, RemoteClient, RemoteError, Transport};
use vtfs::store::Store;
use vtfs::{MountConfig, StoreError, Unlinked, Vtfs, ROOT_INO};

type Script = dyn Fn(&str) -> Result<(u16, String), RemoteError> + Send + Sync;

/// Answers requests by operation and records each request line.
struct Scripted {
    script: Box<Script>,
    requests: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(
        script: impl Fn(&str) -> Result<(u16, String), RemoteError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::default(),
        })
    }

    /// Succeed every call with an empty result.
    fn accepting() -> Arc<Self> {
        Self::new(|_| Ok((200, r#"{"result":{}}"#.to_string())))
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl fmt::Debug for Scripted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scripted")
            .field("requests", &self.requests)
            .finish()
    }
}

impl Transport for Scripted {
    fn round_trip(&self, _endpoint: &Endpoint, request: &[u8]) -> vtfs::remote::Result<Vec<u8>> {
        let request = String::from_utf8(request.to_vec()).unwrap();
        let line = request.lines().next().unwrap().to_string();
        self.requests.lock().unwrap().push(line.clone());

        let (status, body) = (self.script)(&line)?;
        Ok(format!("HTTP/1.1 {status} X\r\nContent-Length: {}\r\n\r\n{body}", body.len()).into_bytes())
    }
}

fn mount(transport: Arc<Scripted>) -> Vtfs {
    let client = RemoteClient::with_transport(Endpoint::default(), "t", transport);
    Vtfs::new(Store::new(), Some(client))
}

#[test]
fn local_mount_never_talks_to_a_remote() {
    let fs = Vtfs::mount(&MountConfig::local()).unwrap();
    assert!(fs.remote().is_none());

    let file = fs.create(ROOT_INO, "a", 0o644).unwrap();
    assert_eq!(fs.write(file.ino, b"data", 0), Ok(4));

    let mut buf = [0; 8];
    assert_eq!(fs.read(file.ino, &mut buf, 0), Ok(4));
    assert_eq!(&buf[..4], b"data");
    assert_eq!(fs.lookup(ROOT_INO, "missing"), Err(StoreError::NotFound));
    assert_eq!(
        fs.unlink(ROOT_INO, "a"),
        Ok(Unlinked::Deleted {
            path: "/a".to_string()
        })
    );
    assert_eq!(fs.unmount(), 1);
}

#[test]
fn mutations_are_replayed() {
    let transport = Scripted::accepting();
    let fs = mount(transport.clone());

    let dir = fs.mkdir(ROOT_INO, "d", 0o755).unwrap();
    let file = fs.create(dir.ino, "f", 0o600).unwrap();
    fs.write(file.ino, b"hi", 3).unwrap();
    fs.unlink(dir.ino, "f").unwrap();
    fs.rmdir(ROOT_INO, "d").unwrap();

    assert_eq!(
        transport.requests(),
        [
            "GET /create?token=t&path=%2Fd&type=dir&mode=755 HTTP/1.1",
            "GET /create?token=t&path=%2Fd%2Ff&type=file&mode=600 HTTP/1.1",
            "GET /write?token=t&path=%2Fd%2Ff&offset=3&data=aGk%3D HTTP/1.1",
            "GET /delete?token=t&path=%2Fd%2Ff HTTP/1.1",
            "GET /delete?token=t&path=%2Fd HTTP/1.1",
        ]
    );
}

#[test]
fn remote_failures_do_not_fail_local_operations() {
    let transport = Scripted::new(|_| Err(RemoteError::ConnectionRefused));
    let fs = mount(transport.clone());

    let file = fs.create(ROOT_INO, "a", 0o644).unwrap();
    assert_eq!(fs.write(file.ino, b"local", 0), Ok(5));

    let mut buf = [0; 5];
    assert_eq!(fs.read(file.ino, &mut buf, 0), Ok(5), "falls back to the cache");
    assert_eq!(&buf, b"local");
    assert!(fs.unlink(ROOT_INO, "a").is_ok());

    assert_eq!(transport.requests().len(), 4);
}

#[test]
fn error_statuses_are_swallowed_too() {
    let transport = Scripted::new(|_| Ok((400, r#"{"error":"EEXIST"}"#.to_string())));
    let fs = mount(transport);
    assert!(fs.create(ROOT_INO, "a", 0o644).is_ok());
}

#[test]
fn miss_fills_from_remote() {
    let transport = Scripted::new(|line| {
        let body = if line.starts_with("GET /stat") {
            r#"{"result":{"ino":7,"type":"file","mode":420,"size":5}}"#
        } else if line.starts_with("GET /read") {
            r#"{"result":{"data":"aGVsbG8="}}"#
        } else {
            return Ok((404, r#"{"error":"ENOSYS"}"#.to_string()));
        };
        Ok((200, body.to_string()))
    });
    let fs = mount(transport.clone());

    let attr = fs.lookup(ROOT_INO, "remote.txt").unwrap();
    assert!(attr.is_file());
    assert_eq!(attr.size, 5);
    assert_eq!(
        transport.requests(),
        [
            "GET /stat?token=t&path=%2Fremote.txt HTTP/1.1",
            "GET /read?token=t&path=%2Fremote.txt&offset=0&size=5 HTTP/1.1",
        ]
    );

    let mut buf = [0; 5];
    assert_eq!(fs.store().read(attr.ino, &mut buf, 0), Ok(5));
    assert_eq!(&buf, b"hello");
    let cached = fs.lookup(ROOT_INO, "remote.txt").unwrap();
    assert_eq!((cached.ino, cached.size), (attr.ino, 5), "now cached");
    assert_eq!(transport.requests().len(), 2, "filled entries are not replayed");
}

#[test]
fn failed_content_fetch_keeps_an_empty_entry() {
    let transport = Scripted::new(|line| {
        if line.starts_with("GET /stat") {
            Ok((200, r#"{"result":{"type":"file","size":5}}"#.to_string()))
        } else {
            Err(RemoteError::ConnectionRefused)
        }
    });
    let fs = mount(transport);

    let attr = fs.lookup(ROOT_INO, "flaky").unwrap();
    assert!(attr.is_file());
    assert_eq!(attr.size, 0);
}

#[test]
fn invalid_names_are_never_asked_for() {
    let transport = Scripted::new(|_| {
        Ok((200, r#"{"result":{"type":"dir","size":0}}"#.to_string()))
    });
    let fs = mount(transport.clone());

    let long = "x".repeat(300);
    for name in [".", "..", "", "a/b", "nul\0", long.as_str()] {
        assert_eq!(fs.lookup(ROOT_INO, name), Err(StoreError::NotFound), "{name:?}");
    }
    assert_eq!(transport.requests(), Vec::<String>::new());
}

#[test]
fn remote_miss_is_not_found() {
    let transport = Scripted::new(|_| Ok((400, r#"{"error":"ENOENT"}"#.to_string())));
    let fs = mount(transport.clone());
    assert_eq!(fs.lookup(ROOT_INO, "nope"), Err(StoreError::NotFound));

    let transport = Scripted::new(|_| Err(RemoteError::ConnectionRefused));
    let fs = mount(transport);
    assert_eq!(fs.lookup(ROOT_INO, "nope"), Err(StoreError::NotFound));
}

#[test]
fn resolve_fills_every_component() {
    let transport = Scripted::new(|line| {
        let body = if line.contains("path=%2Fd%2Ff") {
            r#"{"result":{"type":"file","size":0}}"#
        } else {
            r#"{"result":{"type":"dir","size":0}}"#
        };
        Ok((200, body.to_string()))
    });
    let fs = mount(transport.clone());

    let file = fs.resolve("/d/./f").unwrap();
    assert!(file.is_file());
    assert_eq!(fs.path_of(file.ino).unwrap(), "/d/f");
    assert!(fs.resolve("/d/..").unwrap().is_dir());
    assert_eq!(transport.requests().len(), 2, "empty files need no read");
    assert_eq!(fs.resolve("relative"), Err(StoreError::InvalidName));
}

#[test]
fn reads_prefer_the_remote() {
    let transport = Scripted::new(|_| Ok((200, r#"{"result":{"data":"UkVNT1RF"}}"#.to_string())));
    let fs = mount(transport.clone());
    let file = fs.create(ROOT_INO, "a", 0o644).unwrap();
    fs.store().write(file.ino, b"local!", 0).unwrap();

    let mut buf = [0; 6];
    assert_eq!(fs.read(file.ino, &mut buf, 0), Ok(6));
    assert_eq!(&buf, b"REMOTE");

    let before = transport.requests().len();
    assert_eq!(fs.read(file.ino, &mut buf, 6), Ok(0), "offset at the local size");
    assert_eq!(transport.requests().len(), before);
}

#[test]
fn every_removed_name_is_replayed() {
    let transport = Scripted::accepting();
    let fs = mount(transport.clone());

    let file = fs.create(ROOT_INO, "a", 0o644).unwrap();
    fs.link(file.ino, ROOT_INO, "b").unwrap();
    assert_eq!(fs.unlink(ROOT_INO, "a"), Ok(Unlinked::Live { nlink: 1 }));
    assert_eq!(
        fs.unlink(ROOT_INO, "b"),
        Ok(Unlinked::Deleted {
            path: "/b".to_string()
        })
    );

    assert_eq!(
        transport.requests()[1..].to_vec(),
        [
            "GET /link?token=t&oldpath=%2Fa&newpath=%2Fb HTTP/1.1",
            "GET /delete?token=t&path=%2Fa HTTP/1.1",
            "GET /delete?token=t&path=%2Fb HTTP/1.1",
        ]
    );
}

#[test]
fn local_errors_skip_the_remote() {
    let transport = Scripted::accepting();
    let fs = mount(transport.clone());
    let dir = fs.mkdir(ROOT_INO, "d", 0o755).unwrap();
    let file = fs.create(dir.ino, "f", 0o644).unwrap();

    assert_eq!(fs.mkdir(ROOT_INO, "d", 0o755), Err(StoreError::AlreadyExists));
    assert_eq!(fs.rmdir(ROOT_INO, "d"), Err(StoreError::NotEmpty));
    assert_eq!(fs.link(dir.ino, ROOT_INO, "e"), Err(StoreError::PermissionDenied));
    let past_the_cap = vtfs::store::MAX_FILE_SIZE as u64 + 10;
    assert_eq!(fs.write(file.ino, b"", past_the_cap), Err(StoreError::TooLarge));
    assert_eq!(transport.requests().len(), 2);
}
