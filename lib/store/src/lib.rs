//! The vtfs entry store: a concurrency-safe, in-memory namespace of
//! inode-numbered files and directories.
//!
//! Every entry lives in one registry owned by [`Store`]. Directories
//! refer to their children by `(name, inode)` bindings, so a regular
//! file can be bound under several names (hard links) while its content
//! is stored once.

mod mode;
mod node;
pub mod path;
mod read_dir;
mod store;

pub use mode::{FileKind, Mode};
pub use node::Attr;
pub use read_dir::{DirEntry, ReadDir};
pub use store::{validate_name, Store, Unlinked};

use thiserror::Error;

/// Inode number of an entry.
pub type Ino = u64;

/// Inode number of the root directory.
pub const ROOT_INO: Ino = 1000;

/// First inode number handed out by the allocator.
pub const FIRST_INO: Ino = ROOT_INO + 1;

/// Upper bound on the logical size of a regular file, in bytes.
pub const MAX_FILE_SIZE: usize = 1024 * 1024;

/// Maximum length of a single name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Error type for store operations.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No entry with that name or inode
    #[error("entry not found")]
    NotFound,
    /// The parent of the operation is not a directory
    #[error("not a directory")]
    NotADirectory,
    /// A file operation was attempted on a directory
    #[error("is a directory")]
    NotAFile,
    /// The name or inode is already in use
    #[error("entry already exists")]
    AlreadyExists,
    /// The directory still has children
    #[error("directory not empty")]
    NotEmpty,
    /// The entry cannot be removed (the root)
    #[error("entry is busy")]
    Busy,
    /// The write would grow the file past the size limit
    #[error("file too large")]
    TooLarge,
    /// The content buffer could not be grown
    #[error("out of memory")]
    OutOfMemory,
    /// Hard links to directories are not allowed
    #[error("operation not permitted")]
    PermissionDenied,
    /// Empty names, `.`, `..`, or names containing `/` or NUL
    #[error("invalid name")]
    InvalidName,
    /// The name exceeds [`MAX_NAME_LEN`]
    #[error("name too long")]
    NameTooLong,
    /// The namespace lock was poisoned
    #[error("lock error")]
    Lock,
}

impl StoreError {
    /// The OS error code a filesystem adapter reports for this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound => libc::ENOENT,
            Self::NotADirectory => libc::ENOTDIR,
            Self::NotAFile => libc::EISDIR,
            Self::AlreadyExists => libc::EEXIST,
            Self::NotEmpty => libc::ENOTEMPTY,
            Self::Busy => libc::EBUSY,
            Self::TooLarge => libc::EFBIG,
            Self::OutOfMemory => libc::ENOMEM,
            Self::PermissionDenied => libc::EPERM,
            Self::InvalidName => libc::EINVAL,
            Self::NameTooLong => libc::ENAMETOOLONG,
            Self::Lock => libc::EIO,
        }
    }

    /// Symbolic name of [`Self::errno`], as carried in the remote
    /// protocol's `{"error": ...}` envelope.
    pub fn errno_name(&self) -> &'static str {
        match self {
            Self::NotFound => "ENOENT",
            Self::NotADirectory => "ENOTDIR",
            Self::NotAFile => "EISDIR",
            Self::AlreadyExists => "EEXIST",
            Self::NotEmpty => "ENOTEMPTY",
            Self::Busy => "EBUSY",
            Self::TooLarge => "EFBIG",
            Self::OutOfMemory => "ENOMEM",
            Self::PermissionDenied => "EPERM",
            Self::InvalidName => "EINVAL",
            Self::NameTooLong => "ENAMETOOLONG",
            Self::Lock => "EIO",
        }
    }
}

impl From<StoreError> for std::io::Error {
    fn from(err: StoreError) -> Self {
        std::io::Error::from_raw_os_error(err.errno())
    }
}
