use crate::node::NodeKind;
use crate::{Ino, Mode, Result, Store};

/// One item produced by [`ReadDir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub ino: Ino,
    pub mode: Mode,
}

#[derive(Debug)]
enum Cursor {
    Dot,
    DotDot,
    /// Sequence number of the last emitted child, 0 before the first.
    Children { after: u64 },
    Done,
}

/// Lazy directory listing returned by [`Store::read_dir`].
///
/// The namespace lock is taken afresh for every item. Between two items
/// the cursor resumes after the insertion sequence of the last emitted
/// binding, so concurrent insertions and removals never make it skip or
/// repeat a binding that exists throughout the listing. Bindings added
/// meanwhile show up, and bindings removed before being reached don't.
#[derive(Debug)]
pub struct ReadDir<'a> {
    store: &'a Store,
    dir: Ino,
    cursor: Cursor,
}

impl<'a> ReadDir<'a> {
    pub(crate) fn new(store: &'a Store, dir: Ino) -> Self {
        Self {
            store,
            dir,
            cursor: Cursor::Dot,
        }
    }
}

impl Iterator for ReadDir<'_> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = match self.store.lock() {
            Ok(inner) => inner,
            Err(err) => {
                self.cursor = Cursor::Done;
                return Some(Err(err));
            }
        };

        // The directory went away underneath us.
        let Ok(dir) = inner.node(self.dir) else {
            self.cursor = Cursor::Done;
            return None;
        };
        let NodeKind::Directory(children) = &dir.kind else {
            self.cursor = Cursor::Done;
            return None;
        };

        match &self.cursor {
            Cursor::Dot => {
                self.cursor = Cursor::DotDot;
                Some(Ok(DirEntry {
                    name: ".".to_string(),
                    ino: dir.ino,
                    mode: dir.mode,
                }))
            }
            Cursor::DotDot => {
                self.cursor = Cursor::Children { after: 0 };
                let parent = inner.node(dir.parent()).unwrap_or(dir);
                Some(Ok(DirEntry {
                    name: "..".to_string(),
                    ino: parent.ino,
                    mode: parent.mode,
                }))
            }
            Cursor::Children { after } => {
                let found = children
                    .iter()
                    .filter(|child| child.seq > *after)
                    .find_map(|child| inner.node(child.ino).ok().map(|node| (child, node.mode)));
                match found {
                    Some((child, mode)) => {
                        let entry = DirEntry {
                            name: child.name.clone(),
                            ino: child.ino,
                            mode,
                        };
                        self.cursor = Cursor::Children { after: child.seq };
                        Some(Ok(entry))
                    }
                    None => {
                        self.cursor = Cursor::Done;
                        None
                    }
                }
            }
            Cursor::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Mode, Store, StoreError, ROOT_INO};
    use pretty_assertions::assert_eq;

    fn names(store: &Store, dir: u64) -> Vec<String> {
        store
            .read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().name)
            .collect()
    }

    #[test]
    fn test_readdir() {
        let store = Store::new();
        let foo = store.create(ROOT_INO, "foo", Mode::dir(0o755), None).unwrap();
        store.create(ROOT_INO, "bar", Mode::file(0o644), None).unwrap();
        store.create(foo.ino, "baz", Mode::file(0o644), None).unwrap();

        assert_eq!(names(&store, ROOT_INO), [".", "..", "foo", "bar"]);
        assert_eq!(names(&store, foo.ino), [".", "..", "baz"]);

        let mut listing = store.read_dir(foo.ino).unwrap();
        let dot = listing.next().unwrap().unwrap();
        let dotdot = listing.next().unwrap().unwrap();
        assert_eq!(dot.ino, foo.ino);
        assert_eq!(dotdot.ino, ROOT_INO);
        assert!(dotdot.mode.is_dir());

        let root_listing: Vec<_> = store.read_dir(ROOT_INO).unwrap().collect();
        assert_eq!(root_listing[1].as_ref().unwrap().ino, ROOT_INO, "root is its own parent");
    }

    #[test]
    fn test_readdir_of_a_file() {
        let store = Store::new();
        let file = store.create(ROOT_INO, "file", Mode::file(0o644), None).unwrap();

        assert!(matches!(
            store.read_dir(file.ino),
            Err(StoreError::NotADirectory)
        ));
        assert!(matches!(store.read_dir(4242), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_readdir_survives_removal_of_the_last_item() {
        let store = Store::new();
        for name in ["a", "b", "c", "d"] {
            store.create(ROOT_INO, name, Mode::file(0o644), None).unwrap();
        }

        let mut listing = store.read_dir(ROOT_INO).unwrap();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(listing.next().unwrap().unwrap().name);
        }
        assert_eq!(seen, [".", "..", "a"]);

        store.unlink(ROOT_INO, "a").unwrap();
        seen.extend(listing.map(|entry| entry.unwrap().name));
        assert_eq!(seen, [".", "..", "a", "b", "c", "d"], "nothing is skipped");
    }

    #[test]
    fn test_readdir_survives_removal_of_earlier_items() {
        let store = Store::new();
        for name in ["a", "b", "c", "d"] {
            store.create(ROOT_INO, name, Mode::file(0o644), None).unwrap();
        }

        let mut listing = store.read_dir(ROOT_INO).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(listing.next().unwrap().unwrap().name);
        }
        assert_eq!(seen, [".", "..", "a", "b"]);

        store.unlink(ROOT_INO, "a").unwrap();
        store.unlink(ROOT_INO, "b").unwrap();
        seen.extend(listing.map(|entry| entry.unwrap().name));
        assert_eq!(seen, [".", "..", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_readdir_places_a_recreated_name_last() {
        let store = Store::new();
        store.create(ROOT_INO, "a", Mode::file(0o644), None).unwrap();
        store.create(ROOT_INO, "b", Mode::file(0o644), None).unwrap();

        let mut listing = store.read_dir(ROOT_INO).unwrap();
        listing.next();
        listing.next();
        assert_eq!(listing.next().unwrap().unwrap().name, "a");

        // Re-adding "a" puts a fresh binding after "b".
        store.unlink(ROOT_INO, "a").unwrap();
        store.create(ROOT_INO, "c", Mode::file(0o644), None).unwrap();
        store.create(ROOT_INO, "a", Mode::file(0o644), None).unwrap();

        let rest: Vec<_> = listing.map(|entry| entry.unwrap().name).collect();
        assert_eq!(rest, ["b", "c", "a"]);
    }

    #[test]
    fn test_readdir_sees_later_insertions() {
        let store = Store::new();
        store.create(ROOT_INO, "a", Mode::file(0o644), None).unwrap();

        let mut listing = store.read_dir(ROOT_INO).unwrap();
        listing.next();
        listing.next();
        assert_eq!(listing.next().unwrap().unwrap().name, "a");

        store.create(ROOT_INO, "b", Mode::file(0o644), None).unwrap();
        assert_eq!(listing.next().unwrap().unwrap().name, "b");
        assert!(listing.next().is_none());
        assert!(listing.next().is_none(), "a finished listing stays finished");
    }

    #[test]
    fn test_readdir_of_a_removed_directory() {
        let store = Store::new();
        let dir = store.create(ROOT_INO, "dir", Mode::dir(0o755), None).unwrap();

        let mut listing = store.read_dir(dir.ino).unwrap();
        assert_eq!(listing.next().unwrap().unwrap().name, ".");
        store.rmdir(ROOT_INO, "dir").unwrap();
        assert!(listing.next().is_none());
    }
}
