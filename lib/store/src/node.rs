use crate::{Ino, Mode, Result, StoreError, MAX_FILE_SIZE};
use std::time::{SystemTime, UNIX_EPOCH};

/// Smallest capacity a content buffer grows to.
const MIN_CAPACITY: usize = 64;

/// One name under which a node is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) parent: Ino,
    pub(crate) name: String,
}

/// A child binding held by a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirLink {
    pub(crate) name: String,
    pub(crate) ino: Ino,
    /// Store-wide insertion sequence. Strictly increasing along a
    /// directory's children.
    pub(crate) seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Times {
    pub(crate) accessed: u64,
    pub(crate) modified: u64,
    pub(crate) changed: u64,
}

impl Times {
    fn now() -> Self {
        let now = time();
        Self {
            accessed: now,
            modified: now,
            changed: now,
        }
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    File(Content),
    Directory(Vec<DirLink>),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) ino: Ino,
    pub(crate) mode: Mode,
    pub(crate) nlink: u32,
    pub(crate) times: Times,
    /// Every binding of this node, oldest first. The first one is the
    /// primary binding, used for path resolution. Empty for the root.
    pub(crate) links: Vec<Link>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(ino: Ino, mode: Mode) -> Self {
        let (nlink, kind) = if mode.is_dir() {
            (2, NodeKind::Directory(Vec::new()))
        } else {
            (1, NodeKind::File(Content::default()))
        };
        Self {
            ino,
            mode,
            nlink,
            times: Times::now(),
            links: Vec::new(),
            kind,
        }
    }

    /// Primary parent; the root is its own parent.
    pub(crate) fn parent(&self) -> Ino {
        self.links.first().map_or(self.ino, |link| link.parent)
    }

    pub(crate) fn attr(&self) -> Attr {
        let size = match &self.kind {
            NodeKind::File(content) => content.len() as u64,
            NodeKind::Directory(_) => 0,
        };
        Attr {
            ino: self.ino,
            mode: self.mode,
            nlink: self.nlink,
            size,
            accessed: self.times.accessed,
            modified: self.times.modified,
            changed: self.times.changed,
        }
    }

    pub(crate) fn touch_modified(&mut self) {
        let now = time();
        self.times.modified = now;
        self.times.changed = now;
    }

    pub(crate) fn touch_changed(&mut self) {
        self.times.changed = time();
    }
}

/// A snapshot of an entry's attributes.
///
/// Timestamps are nanoseconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub ino: Ino,
    pub mode: Mode,
    pub nlink: u32,
    pub size: u64,
    pub accessed: u64,
    pub modified: u64,
    pub changed: u64,
}

impl Attr {
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.mode.is_file()
    }
}

/// Content of a regular file. The logical size is the vector's length,
/// the allocated capacity its capacity.
#[derive(Debug, Default)]
pub(crate) struct Content {
    data: Vec<u8>,
}

impl Content {
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub(crate) fn read(&self, buf: &mut [u8], offset: u64) -> usize {
        let offset = match usize::try_from(offset) {
            Ok(offset) if offset < self.data.len() => offset,
            _ => return 0,
        };
        let n = buf.len().min(self.data.len() - offset);
        buf[..n].copy_from_slice(&self.data[offset..offset + n]);
        n
    }

    pub(crate) fn write(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let end = usize::try_from(offset)
            .ok()
            .and_then(|offset| offset.checked_add(buf.len()))
            .filter(|end| *end <= MAX_FILE_SIZE)
            .ok_or(StoreError::TooLarge)?;
        if buf.is_empty() {
            return Ok(0);
        }
        let offset = end - buf.len();

        if end > self.data.capacity() {
            let target = (self.data.capacity() * 2)
                .max(MIN_CAPACITY)
                .min(MAX_FILE_SIZE)
                .max(end);
            self.data
                .try_reserve_exact(target - self.data.len())
                .map_err(|_| StoreError::OutOfMemory)?;
        }

        // Zero-fills any gap between the old size and `offset`.
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(buf);

        Ok(buf.len())
    }
}

pub(crate) fn time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}
