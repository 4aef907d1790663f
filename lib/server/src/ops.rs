//! One function per remote operation. Each returns the `result` value
//! of a successful response.

use crate::query::Query;
use crate::ApiError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use vtfs_store::{path, Attr, FileKind, Ino, Mode, Store, StoreError, ROOT_INO};

type Result<T, E = ApiError> = std::result::Result<T, E>;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Resolve the directory holding the last component of `path`.
fn parent_and_name<'a>(store: &Store, path: &'a str) -> Result<(Ino, &'a str)> {
    let (parent, name) = path::split_parent(path).ok_or(StoreError::InvalidName)?;
    let parent = store.resolve(parent)?;
    if !parent.is_dir() {
        return Err(StoreError::NotADirectory.into());
    }
    Ok((parent.ino, name))
}

fn kind_name(attr: &Attr) -> &'static str {
    attr.mode.kind().as_str()
}

pub(crate) fn list(store: &Store, query: &Query) -> Result<Value> {
    let dir = store.resolve(query.get("path").unwrap_or("/"))?;
    if !dir.is_dir() {
        return Err(StoreError::NotADirectory.into());
    }

    let mut children = Vec::new();
    for entry in store.read_dir(dir.ino)? {
        let entry = entry?;
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        // Removed since it was listed.
        let Ok(attr) = store.get(entry.ino) else {
            continue;
        };
        children.push(json!({
            "name": entry.name,
            "ino": attr.ino,
            "type": kind_name(&attr),
            "mode": attr.mode.perm(),
            "size": attr.size,
        }));
    }
    Ok(Value::Array(children))
}

pub(crate) fn create(store: &Store, query: &Query) -> Result<Value> {
    let path = query.required("path")?;
    let kind: FileKind = query
        .get("type")
        .unwrap_or("file")
        .parse()
        .map_err(|_| ApiError::InvalidParameter("type"))?;
    let perm = u32::from_str_radix(query.get("mode").unwrap_or("777"), 8)
        .map_err(|_| ApiError::InvalidParameter("mode"))?;

    if store.resolve(path).is_ok() {
        return Err(StoreError::AlreadyExists.into());
    }
    let (parent, name) = parent_and_name(store, path)?;
    let attr = store.create(parent, name, Mode::new(kind, perm & Mode::DEFAULT_PERM), None)?;

    Ok(json!({ "ino": attr.ino, "path": store.path_of(attr.ino)? }))
}

pub(crate) fn delete(store: &Store, query: &Query) -> Result<Value> {
    let path = query.required("path")?;
    if store.resolve(path)?.ino == ROOT_INO {
        return Err(StoreError::Busy.into());
    }
    let (parent, name) = parent_and_name(store, path)?;
    store.remove(parent, name)?;

    Ok(json!({ "deleted": path }))
}

pub(crate) fn read(store: &Store, query: &Query) -> Result<Value> {
    let attr = store.resolve(query.required("path")?)?;
    if !attr.is_file() {
        return Err(StoreError::NotAFile.into());
    }
    let offset: u64 = query.parsed_or("offset", 0)?;
    let size: Option<u64> = query.parsed("size")?;

    let available = attr.size.saturating_sub(offset);
    let len = size.map_or(available, |size| size.min(available));
    let mut data = vec![0; len as usize];
    let read = store.read(attr.ino, &mut data, offset)?;
    data.truncate(read);

    Ok(json!({ "data": STANDARD.encode(&data) }))
}

pub(crate) fn write(store: &Store, query: &Query) -> Result<Value> {
    let attr = store.resolve(query.required("path")?)?;
    if !attr.is_file() {
        return Err(StoreError::NotAFile.into());
    }
    let offset: u64 = query.parsed_or("offset", 0)?;
    let data = STANDARD
        .decode(query.required("data")?)
        .map_err(|_| ApiError::InvalidParameter("data"))?;

    let written = store.write(attr.ino, &data, offset)?;
    Ok(json!({ "written": written }))
}

pub(crate) fn stat(store: &Store, query: &Query) -> Result<Value> {
    let attr = store.resolve(query.required("path")?)?;

    Ok(json!({
        "ino": attr.ino,
        "type": kind_name(&attr),
        "mode": attr.mode.perm(),
        "nlink": attr.nlink,
        "size": attr.size,
        "atime": attr.accessed / NANOS_PER_SECOND,
        "mtime": attr.modified / NANOS_PER_SECOND,
        "ctime": attr.changed / NANOS_PER_SECOND,
    }))
}

pub(crate) fn link(store: &Store, query: &Query) -> Result<Value> {
    let target = store.resolve(query.required("oldpath")?)?;
    let new_path = query.required("newpath")?;
    if target.is_dir() {
        return Err(StoreError::PermissionDenied.into());
    }
    let (parent, name) = parent_and_name(store, new_path)?;
    store.add_link(target.ino, parent, name)?;

    Ok(json!({ "linked": new_path }))
}
