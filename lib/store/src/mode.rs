use std::fmt;

/// Whether an entry is a directory or a regular file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Directory,
}

impl FileKind {
    /// The wire name, `"file"` or `"dir"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "dir",
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = crate::StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "dir" => Ok(Self::Directory),
            _ => Err(crate::StoreError::InvalidName),
        }
    }
}

/// A file-type-and-permission word, laid out like `st_mode`.
///
/// A `Mode` is always either a directory or a regular file.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Mode(u32);

impl Mode {
    pub const S_IFMT: u32 = 0o170000;
    pub const S_IFDIR: u32 = 0o040000;
    pub const S_IFREG: u32 = 0o100000;
    pub const PERM_MASK: u32 = 0o7777;
    pub const DEFAULT_PERM: u32 = 0o777;

    pub const fn new(kind: FileKind, perm: u32) -> Self {
        let ty = match kind {
            FileKind::File => Self::S_IFREG,
            FileKind::Directory => Self::S_IFDIR,
        };
        Self(ty | (perm & Self::PERM_MASK))
    }

    pub const fn dir(perm: u32) -> Self {
        Self::new(FileKind::Directory, perm)
    }

    pub const fn file(perm: u32) -> Self {
        Self::new(FileKind::File, perm)
    }

    /// Parse a raw `st_mode` word. Returns `None` for file types other
    /// than directory and regular file.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits & Self::S_IFMT {
            Self::S_IFDIR => Some(Self::dir(bits)),
            Self::S_IFREG => Some(Self::file(bits)),
            _ => None,
        }
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn perm(&self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    pub fn kind(&self) -> FileKind {
        if self.is_dir() {
            FileKind::Directory
        } else {
            FileKind::File
        }
    }

    pub fn is_dir(&self) -> bool {
        self.0 & Self::S_IFMT == Self::S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.0 & Self::S_IFMT == Self::S_IFREG
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode({:#o})", self.0)
    }
}

/// `ls -l` style rendering, e.g. `drwxr-xr-x`.
impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = if self.is_dir() { 'd' } else { '-' };
        let mut out = String::with_capacity(10);
        out.push(ty);
        for shift in [6, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&out)
    }
}
