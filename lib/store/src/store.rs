//! This module contains the [`Store`] type itself.

use crate::node::{time, DirLink, Link, Node, NodeKind};
use crate::read_dir::ReadDir;
use crate::{path, Attr, Ino, Mode, Result, StoreError, FIRST_INO, MAX_NAME_LEN, ROOT_INO};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The in-memory namespace.
///
/// All state sits behind one exclusive lock; every operation holds it
/// for its whole critical section and never across a call out of the
/// store.
pub struct Store {
    pub(crate) inner: Mutex<StoreInner>,
}

/// Outcome of removing one binding of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unlinked {
    /// Other bindings still reference the entry.
    Live { nlink: u32 },
    /// The last binding went away and the entry was freed. `path` is
    /// the removed binding's path, computed before removal.
    Deleted { path: String },
}

impl Store {
    /// Create a store holding only the root directory.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| StoreError::Lock)
    }

    /// Create `name` under `parent`.
    ///
    /// A nonzero `ino` is used verbatim (for entries mirrored from a
    /// remote store); otherwise the next free inode number is used.
    pub fn create(&self, parent: Ino, name: &str, mode: Mode, ino: Option<Ino>) -> Result<Attr> {
        validate_name(name)?;
        let attr = self.lock()?.create(parent, name, mode, ino, &[])?;
        tracing::trace!(parent, name, ino = attr.ino, ?mode, "created entry");
        Ok(attr)
    }

    /// Create the regular file `name` under `parent`, holding `content`.
    ///
    /// Nobody can observe the file before its content is in place.
    pub fn create_with_content(
        &self,
        parent: Ino,
        name: &str,
        mode: Mode,
        content: &[u8],
    ) -> Result<Attr> {
        validate_name(name)?;
        let attr = self.lock()?.create(parent, name, mode, None, content)?;
        tracing::trace!(parent, name, ino = attr.ino, size = attr.size, "created filled entry");
        Ok(attr)
    }

    /// Find `name` among the children of `parent`.
    pub fn lookup(&self, parent: Ino, name: &str) -> Result<Attr> {
        let inner = self.lock()?;
        let (_, ino) = inner.as_parent_get_position_and_ino(parent, name)?;
        inner.attr(ino)
    }

    /// Attributes of the entry numbered `ino`.
    pub fn get(&self, ino: Ino) -> Result<Attr> {
        self.lock()?.attr(ino)
    }

    /// Remove the primary binding of `ino`.
    ///
    /// When other names still refer to the entry, the oldest of them
    /// becomes primary.
    pub fn delete(&self, ino: Ino) -> Result<Unlinked> {
        let mut inner = self.lock()?;
        if ino == ROOT_INO {
            return Err(StoreError::Busy);
        }
        let link = inner
            .node(ino)?
            .links
            .first()
            .cloned()
            .ok_or(StoreError::NotFound)?;
        inner.remove_binding(link.parent, &link.name, Expect::Any)
    }

    /// Remove the binding `name` of `parent`, whatever the type of the
    /// entry it names.
    pub fn remove(&self, parent: Ino, name: &str) -> Result<Unlinked> {
        self.lock()?.remove_binding(parent, name, Expect::Any)
    }

    /// Remove the binding `name` of `parent`, which must not be a
    /// directory.
    pub fn unlink(&self, parent: Ino, name: &str) -> Result<Unlinked> {
        self.lock()?.remove_binding(parent, name, Expect::File)
    }

    /// Remove the empty directory `name` of `parent`.
    pub fn rmdir(&self, parent: Ino, name: &str) -> Result<Unlinked> {
        self.lock()?.remove_binding(parent, name, Expect::Directory)
    }

    /// Copy bytes of `ino` starting at `offset` into `buf`.
    ///
    /// Returns 0 once `offset` reaches the end of the file.
    pub fn read(&self, ino: Ino, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut inner = self.lock()?;
        let node = inner.node_mut(ino)?;
        let NodeKind::File(content) = &node.kind else {
            return Err(StoreError::NotAFile);
        };
        let read = content.read(buf, offset);
        node.times.accessed = time();
        Ok(read)
    }

    /// Write `buf` into `ino` at `offset`, growing the file as needed.
    pub fn write(&self, ino: Ino, buf: &[u8], offset: u64) -> Result<usize> {
        let mut inner = self.lock()?;
        let node = inner.node_mut(ino)?;
        let NodeKind::File(content) = &mut node.kind else {
            return Err(StoreError::NotAFile);
        };
        let written = content.write(buf, offset)?;
        node.touch_modified();
        Ok(written)
    }

    /// Bind the regular file `target` under `parent` as `name`.
    pub fn add_link(&self, target: Ino, parent: Ino, name: &str) -> Result<Attr> {
        validate_name(name)?;
        let mut inner = self.lock()?;

        if !inner.node(target)?.mode.is_file() {
            return Err(StoreError::PermissionDenied);
        }
        inner.ensure_name_is_free(parent, name)?;

        inner.add_child_to_node(parent, name, target, false)?;
        let node = inner.node_mut(target)?;
        node.links.push(Link {
            parent,
            name: name.to_string(),
        });
        node.nlink += 1;
        node.touch_changed();

        tracing::trace!(target, parent, name, nlink = node.nlink, "added link");
        Ok(node.attr())
    }

    /// Iterate over the entries of the directory `dir`, starting with
    /// `.` and `..`.
    pub fn read_dir(&self, dir: Ino) -> Result<ReadDir<'_>> {
        match self.lock()?.node(dir)?.kind {
            NodeKind::Directory(_) => Ok(ReadDir::new(self, dir)),
            NodeKind::File(_) => Err(StoreError::NotADirectory),
        }
    }

    /// Absolute path of `ino` through its primary bindings.
    pub fn path_of(&self, ino: Ino) -> Result<String> {
        self.lock()?.path_of(ino)
    }

    /// Resolve an absolute path to an entry.
    pub fn resolve(&self, path: &str) -> Result<Attr> {
        let inner = self.lock()?;
        if !path.starts_with('/') {
            return Err(StoreError::InvalidName);
        }

        let mut current = ROOT_INO;
        for component in path.split('/') {
            current = match component {
                "" | "." => current,
                ".." => inner.node(current)?.parent(),
                name => inner.as_parent_get_position_and_ino(current, name)?.1,
            };
        }
        inner.attr(current)
    }

    /// Free every entry, children before their parents.
    ///
    /// Returns how many entries were freed.
    pub fn unmount(self) -> usize {
        let mut inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut freed = inner.teardown(ROOT_INO);
        freed += inner.entries.drain().count();
        tracing::debug!(freed, "tore down store");
        freed
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.lock() {
            Ok(inner) => fmt::Debug::fmt(&*inner, formatter),
            Err(_) => formatter.write_str("<poisoned store>"),
        }
    }
}

/// Which kind of entry a removal accepts.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expect {
    Any,
    File,
    Directory,
}

pub(crate) struct StoreInner {
    pub(crate) entries: HashMap<Ino, Node>,
    pub(crate) next_ino: Ino,
    pub(crate) next_seq: u64,
}

impl StoreInner {
    pub(crate) fn node(&self, ino: Ino) -> Result<&Node> {
        self.entries.get(&ino).ok_or(StoreError::NotFound)
    }

    fn node_mut(&mut self, ino: Ino) -> Result<&mut Node> {
        self.entries.get_mut(&ino).ok_or(StoreError::NotFound)
    }

    fn attr(&self, ino: Ino) -> Result<Attr> {
        self.node(ino).map(Node::attr)
    }

    fn allocate_ino(&mut self) -> Ino {
        while self.entries.contains_key(&self.next_ino) {
            self.next_ino += 1;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        ino
    }

    fn create(
        &mut self,
        parent: Ino,
        name: &str,
        mode: Mode,
        ino: Option<Ino>,
        content: &[u8],
    ) -> Result<Attr> {
        self.ensure_name_is_free(parent, name)?;
        if !content.is_empty() && !mode.is_file() {
            return Err(StoreError::NotAFile);
        }

        let ino = match ino.filter(|ino| *ino != 0) {
            Some(ino) if self.entries.contains_key(&ino) => return Err(StoreError::AlreadyExists),
            Some(ino) => ino,
            None => self.allocate_ino(),
        };

        let mut node = Node::new(ino, mode);
        if let NodeKind::File(data) = &mut node.kind {
            data.write(content, 0)?;
        }
        node.links.push(Link {
            parent,
            name: name.to_string(),
        });
        let attr = node.attr();
        self.entries.insert(ino, node);
        self.add_child_to_node(parent, name, ino, mode.is_dir())?;

        Ok(attr)
    }

    /// Fails unless `parent` is a directory without a child named `name`.
    fn ensure_name_is_free(&self, parent: Ino, name: &str) -> Result<()> {
        match self.as_parent_get_position_and_ino(parent, name) {
            Ok(_) => Err(StoreError::AlreadyExists),
            Err(StoreError::NotFound) if self.entries.contains_key(&parent) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// From the inode of a parent node (so, a directory), returns the
    /// child index of `name` along with its inode.
    pub(crate) fn as_parent_get_position_and_ino(
        &self,
        parent: Ino,
        name: &str,
    ) -> Result<(usize, Ino)> {
        match &self.node(parent)?.kind {
            NodeKind::Directory(children) => children
                .iter()
                .position(|child| child.name == name)
                .map(|position| (position, children[position].ino))
                .ok_or(StoreError::NotFound),
            NodeKind::File(_) => Err(StoreError::NotADirectory),
        }
    }

    /// Add a child binding to the directory `parent`.
    ///
    /// This also updates the modified time of the directory, and its
    /// link count when the child is a directory.
    fn add_child_to_node(&mut self, parent: Ino, name: &str, ino: Ino, is_dir: bool) -> Result<()> {
        let seq = self.next_seq;
        self.next_seq += 1;
        let node = self.node_mut(parent)?;
        let NodeKind::Directory(children) = &mut node.kind else {
            return Err(StoreError::NotADirectory);
        };
        children.push(DirLink {
            name: name.to_string(),
            ino,
            seq,
        });
        if is_dir {
            node.nlink += 1;
        }
        node.touch_modified();
        Ok(())
    }

    /// Remove the child binding at `position` of the directory `parent`.
    fn remove_child_from_node(&mut self, parent: Ino, position: usize, is_dir: bool) -> Result<()> {
        let node = self.node_mut(parent)?;
        let NodeKind::Directory(children) = &mut node.kind else {
            return Err(StoreError::NotADirectory);
        };
        children.remove(position);
        if is_dir {
            node.nlink -= 1;
        }
        node.touch_modified();
        Ok(())
    }

    fn remove_binding(&mut self, parent: Ino, name: &str, expect: Expect) -> Result<Unlinked> {
        let (position, ino) = self.as_parent_get_position_and_ino(parent, name)?;
        if ino == ROOT_INO {
            return Err(StoreError::Busy);
        }

        let node = self.node(ino)?;
        let is_dir = match (&node.kind, expect) {
            (NodeKind::Directory(_), Expect::File) => return Err(StoreError::NotAFile),
            (NodeKind::File(_), Expect::Directory) => return Err(StoreError::NotADirectory),
            (NodeKind::Directory(children), _) if !children.is_empty() => {
                return Err(StoreError::NotEmpty)
            }
            (NodeKind::Directory(_), _) => true,
            (NodeKind::File(_), _) => false,
        };

        let path = path::join(&self.path_of(parent)?, name);
        self.remove_child_from_node(parent, position, is_dir)?;

        let node = self.node_mut(ino)?;
        if let Some(nth) = node
            .links
            .iter()
            .position(|link| link.parent == parent && link.name == name)
        {
            node.links.remove(nth);
        }
        // A directory is only ever bound once.
        node.nlink = if is_dir { 0 } else { node.nlink.saturating_sub(1) };
        node.touch_changed();

        if node.nlink > 0 {
            tracing::trace!(ino, %path, nlink = node.nlink, "removed link");
            return Ok(Unlinked::Live { nlink: node.nlink });
        }

        self.entries.remove(&ino);
        tracing::trace!(ino, %path, "deleted entry");
        Ok(Unlinked::Deleted { path })
    }

    fn path_of(&self, ino: Ino) -> Result<String> {
        let mut names = Vec::new();
        let mut current = self.node(ino)?;

        // Bounded so that a corrupted parent chain can't spin forever.
        for _ in 0..=self.entries.len() {
            let Some(link) = current.links.first() else {
                break;
            };
            names.push(link.name.as_str());
            current = self.node(link.parent)?;
        }

        if names.is_empty() {
            return Ok("/".to_string());
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push('/');
            path.push_str(name);
        }
        Ok(path)
    }

    fn teardown(&mut self, ino: Ino) -> usize {
        let mut freed = 0;
        let mut pending = vec![ino];
        while let Some(ino) = pending.pop() {
            let Some(node) = self.entries.remove(&ino) else {
                continue;
            };
            freed += 1;
            if let NodeKind::Directory(children) = node.kind {
                pending.extend(children.into_iter().map(|child| child.ino));
            }
        }
        freed
    }
}

impl Default for StoreInner {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(ROOT_INO, Node::new(ROOT_INO, Mode::dir(Mode::DEFAULT_PERM)));

        Self {
            entries,
            next_ino: FIRST_INO,
            next_seq: 1,
        }
    }
}

impl fmt::Debug for StoreInner {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            formatter,
            "\n{inode:<8}    {ty:<4}    name",
            inode = "inode",
            ty = "type",
        )?;

        // Depth-first, children in order, without recursing.
        let mut pending = vec![(ROOT_INO, "/", 0)];
        while let Some((ino, name, indentation)) = pending.pop() {
            let Some(node) = self.entries.get(&ino) else {
                continue;
            };
            writeln!(
                formatter,
                "{inode:<8}    {ty:<4}   {indentation_symbol:indentation_width$}{name}",
                inode = node.ino,
                ty = node.mode.kind().as_str(),
                indentation_symbol = " ",
                indentation_width = indentation * 2 + 1,
            )?;

            if let NodeKind::Directory(children) = &node.kind {
                pending.extend(
                    children
                        .iter()
                        .rev()
                        .map(|child| (child.ino, child.name.as_str(), indentation + 1)),
                );
            }
        }

        Ok(())
    }
}

/// Check that `name` can name a directory entry.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(StoreError::InvalidName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StoreError::NameTooLong);
    }
    Ok(())
}
