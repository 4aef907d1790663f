//! `vtfs` keeps a filesystem namespace in memory and, optionally,
//! mirrors it to a remote store.
//!
//! The namespace itself lives in [`vtfs_store`]; the remote protocol in
//! [`vtfs_remote`]. [`Vtfs`] ties the two together:
//!
//! * successful local mutations are replayed to the remote store
//!   (write-through), with remote failures logged and ignored;
//! * a lookup that misses locally asks the remote store and caches what
//!   it finds (read-through);
//! * file reads prefer the remote copy and fall back to the cache.
//!
//! ```no_run
//! use vtfs::{MountConfig, Vtfs};
//!
//! let fs = Vtfs::mount(&MountConfig::remote("http://127.0.0.1:8080", "token"))?;
//! let root = fs.root()?;
//! let file = fs.create(root.ino, "hello.txt", 0o644)?;
//! fs.write(file.ino, b"hello", 0)?;
//! fs.unmount();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod vtfs;

pub use crate::config::{MountConfig, MountError, RemoteConfig, SERVER_ENV_VAR, TOKEN_ENV_VAR};
pub use crate::vtfs::Vtfs;

pub use vtfs_remote as remote;
pub use vtfs_store as store;
pub use vtfs_store::{Attr, DirEntry, FileKind, Ino, Mode, StoreError, Unlinked, ROOT_INO};
