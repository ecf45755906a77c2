//! Directory listing under the mount root
//!
//! Requested paths are relative to the mount. `..`, absolute paths and
//! symlinks resolving outside the mount are all refused.

use crate::error::ListingError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Kind of a directory entry, as seen without following links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link
    Symlink,
}

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// File name
    pub name: String,
    /// Entry kind
    pub kind: EntryKind,
    /// Size in bytes
    pub size: u64,
    /// Last modification, RFC 3339
    pub modified: Option<DateTime<Utc>>,
}

/// Contents of one directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    /// Requested path, normalized, relative to the mount
    pub path: String,
    /// Entries sorted by name
    pub entries: Vec<Entry>,
}

/// Normalize `requested` into a relative path below the mount
pub fn normalize(requested: &str) -> Result<PathBuf, ListingError> {
    let mut relative = PathBuf::new();
    for component in Path::new(requested.trim()).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ListingError::OutsideMount(requested.to_string()));
            }
        }
    }
    Ok(relative)
}

/// Resolve `requested` against `root`, following links, and keep it inside
pub fn resolve(root: &Path, requested: &str) -> Result<PathBuf, ListingError> {
    let relative = normalize(requested)?;
    let root = fs::canonicalize(root)?;
    let resolved = match fs::canonicalize(root.join(&relative)) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ListingError::NotFound(requested.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    if !resolved.starts_with(&root) {
        return Err(ListingError::OutsideMount(requested.to_string()));
    }
    Ok(resolved)
}

/// List the directory at `requested` below `root`
pub fn list_directory(root: &Path, requested: &str) -> Result<Listing, ListingError> {
    let directory = resolve(root, requested)?;
    if !directory.is_dir() {
        return Err(ListingError::NotADirectory(requested.to_string()));
    }

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(&directory)? {
        let dir_entry = dir_entry?;
        let metadata = dir_entry.path().symlink_metadata()?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(Entry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            kind,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Listing {
        path: normalize(requested)?.to_string_lossy().into_owned(),
        entries,
    })
}
