use crate::{MountConfig, MountError};
use std::fmt::Display;
use vtfs_remote::{EntryKind, RemoteClient};
use vtfs_store::{
    path, validate_name, Attr, FileKind, Ino, Mode, ReadDir, Result, Store, StoreError, Unlinked,
    MAX_FILE_SIZE, ROOT_INO,
};

/// A mounted namespace.
///
/// Every operation runs against the local [`Store`] first. When a remote
/// store is configured, successful mutations are replayed to it and
/// lookup misses are satisfied from it. Remote calls never run while
/// the store lock is held, and their failures never fail the local
/// operation.
#[derive(Debug)]
pub struct Vtfs {
    store: Store,
    remote: Option<RemoteClient>,
}

impl Vtfs {
    pub fn mount(config: &MountConfig) -> Result<Self, MountError> {
        let remote = config.client()?;
        match &remote {
            Some(remote) => tracing::debug!(endpoint = %remote.endpoint(), "mounted with remote"),
            None => tracing::debug!("mounted locally"),
        }
        Ok(Self::new(Store::new(), remote))
    }

    pub fn new(store: Store, remote: Option<RemoteClient>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn remote(&self) -> Option<&RemoteClient> {
        self.remote.as_ref()
    }

    pub fn root(&self) -> Result<Attr> {
        self.store.get(ROOT_INO)
    }

    pub fn getattr(&self, ino: Ino) -> Result<Attr> {
        self.store.get(ino)
    }

    pub fn path_of(&self, ino: Ino) -> Result<String> {
        self.store.path_of(ino)
    }

    /// Create the regular file `name` in `parent`.
    pub fn create(&self, parent: Ino, name: &str, perm: u32) -> Result<Attr> {
        self.make(parent, name, Mode::file(perm))
    }

    /// Create the directory `name` in `parent`.
    pub fn mkdir(&self, parent: Ino, name: &str, perm: u32) -> Result<Attr> {
        self.make(parent, name, Mode::dir(perm))
    }

    fn make(&self, parent: Ino, name: &str, mode: Mode) -> Result<Attr> {
        let attr = self.store.create(parent, name, mode, None)?;

        if let Some(remote) = &self.remote {
            if let Some(path) = self.path_for_sync(attr.ino) {
                let kind = entry_kind(mode.kind());
                complain("create", &path, remote.create(&path, kind, mode.bits()));
            }
        }
        Ok(attr)
    }

    /// Find `name` in `parent`, asking the remote store when it isn't
    /// cached locally.
    pub fn lookup(&self, parent: Ino, name: &str) -> Result<Attr> {
        match (self.store.lookup(parent, name), &self.remote) {
            (Err(StoreError::NotFound), Some(remote)) if validate_name(name).is_ok() => {
                self.fill_from_remote(remote, parent, name)
            }
            (result, _) => result,
        }
    }

    /// Materialize the remote entry `name` of `parent` locally, content
    /// included. The new entry is not replayed to the remote store.
    ///
    /// The content is fetched before the entry is created, so a lookup
    /// racing with the fill sees either nothing or the filled entry.
    fn fill_from_remote(&self, remote: &RemoteClient, parent: Ino, name: &str) -> Result<Attr> {
        let path = path::join(&self.store.path_of(parent)?, name);
        let stat = remote.stat(&path).map_err(|err| {
            tracing::debug!(%path, error = %err, "not found remotely");
            StoreError::NotFound
        })?;
        let mode = Mode::from_bits(stat.mode).ok_or(StoreError::NotFound)?;

        let mut data = Vec::new();
        if stat.kind == EntryKind::File && stat.size > 0 {
            let len = usize::try_from(stat.size).unwrap_or(MAX_FILE_SIZE).min(MAX_FILE_SIZE);
            data.resize(len, 0);
            match remote.read(&path, &mut data, 0) {
                Ok(read) => data.truncate(read),
                Err(err) => {
                    tracing::warn!(%path, error = %err, "failed to fetch remote content");
                    data.clear();
                }
            }
        }

        match self.store.create_with_content(parent, name, mode, &data) {
            Ok(attr) => {
                tracing::debug!(%path, ino = attr.ino, size = attr.size, "filled from remote");
                Ok(attr)
            }
            // Someone else filled it first.
            Err(StoreError::AlreadyExists) => self.store.lookup(parent, name),
            Err(err) => {
                tracing::debug!(%path, error = %err, "unable to cache remote entry");
                Err(StoreError::NotFound)
            }
        }
    }

    /// Resolve an absolute path one component at a time through
    /// [`Vtfs::lookup`].
    pub fn resolve(&self, path: &str) -> Result<Attr> {
        if !path.starts_with('/') {
            return Err(StoreError::InvalidName);
        }

        let mut ancestors = vec![ROOT_INO];
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    if ancestors.len() > 1 {
                        ancestors.pop();
                    }
                }
                name => {
                    let parent = ancestors.last().copied().unwrap_or(ROOT_INO);
                    ancestors.push(self.lookup(parent, name)?.ino);
                }
            }
        }
        self.store.get(ancestors.last().copied().unwrap_or(ROOT_INO))
    }

    /// Read from `ino` at `offset`, preferring the remote copy.
    ///
    /// Returns 0 once `offset` reaches the local size.
    pub fn read(&self, ino: Ino, buf: &mut [u8], offset: u64) -> Result<usize> {
        let attr = self.store.get(ino)?;
        if !attr.is_file() {
            return Err(StoreError::NotAFile);
        }
        if offset >= attr.size {
            return Ok(0);
        }

        if let Some(remote) = &self.remote {
            if let Some(path) = self.path_for_sync(ino) {
                match remote.read(&path, buf, offset) {
                    Ok(read) => return Ok(read),
                    Err(err) => tracing::warn!(%path, error = %err, "remote read failed, using cache"),
                }
            }
        }
        self.store.read(ino, buf, offset)
    }

    /// Write to `ino` at `offset`. The caller sees the local result.
    pub fn write(&self, ino: Ino, buf: &[u8], offset: u64) -> Result<usize> {
        let written = self.store.write(ino, buf, offset)?;

        if let Some(remote) = &self.remote {
            if let Some(path) = self.path_for_sync(ino) {
                complain("write", &path, remote.write(&path, buf, offset));
            }
        }
        Ok(written)
    }

    /// Remove the regular file binding `name` of `parent`.
    pub fn unlink(&self, parent: Ino, name: &str) -> Result<Unlinked> {
        let dir = self.remote.as_ref().and_then(|_| self.path_for_sync(parent));
        let unlinked = self.store.unlink(parent, name)?;
        self.sync_removal(dir, name);
        Ok(unlinked)
    }

    /// Remove the empty directory `name` of `parent`.
    pub fn rmdir(&self, parent: Ino, name: &str) -> Result<Unlinked> {
        let dir = self.remote.as_ref().and_then(|_| self.path_for_sync(parent));
        let unlinked = self.store.rmdir(parent, name)?;
        self.sync_removal(dir, name);
        Ok(unlinked)
    }

    /// The remote store drops exactly the named binding, so every local
    /// removal is replayed, whether or not other names remain.
    fn sync_removal(&self, dir: Option<String>, name: &str) {
        if let (Some(remote), Some(dir)) = (&self.remote, dir) {
            let path = path::join(&dir, name);
            complain("delete", &path, remote.delete(&path));
        }
    }

    /// Bind the regular file `target` as `name` in `parent`.
    pub fn link(&self, target: Ino, parent: Ino, name: &str) -> Result<Attr> {
        let attr = self.store.add_link(target, parent, name)?;

        if let Some(remote) = &self.remote {
            if let (Some(old), Some(dir)) = (self.path_for_sync(target), self.path_for_sync(parent)) {
                let new = path::join(&dir, name);
                complain("link", &new, remote.link(&old, &new));
            }
        }
        Ok(attr)
    }

    /// List the locally cached entries of `dir`.
    pub fn read_dir(&self, dir: Ino) -> Result<ReadDir<'_>> {
        self.store.read_dir(dir)
    }

    /// Tear the namespace down, returning how many entries were freed.
    pub fn unmount(self) -> usize {
        self.store.unmount()
    }

    fn path_for_sync(&self, ino: Ino) -> Option<String> {
        match self.store.path_of(ino) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(ino, error = %err, "entry vanished before it could be synced");
                None
            }
        }
    }
}

fn entry_kind(kind: FileKind) -> EntryKind {
    match kind {
        FileKind::File => EntryKind::File,
        FileKind::Directory => EntryKind::Dir,
    }
}

/// Log a failed write-through call. The local operation already
/// succeeded.
fn complain<T, E: Display>(operation: &'static str, path: &str, result: Result<T, E>) {
    if let Err(err) = result {
        tracing::warn!(operation, path, error = %err, "remote sync failed");
    }
}
