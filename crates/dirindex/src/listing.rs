//! Directory listing, the only filesystem primitive the crawler depends on.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::PathRecord;

/// One child of a listed directory.
///
/// `name` is the lossy UTF-8 form used for matching and fingerprinting.
/// `file_name` is the name as the OS reported it and is the only thing
/// child paths are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub file_name: OsString,
    pub is_directory: bool,
}

impl ListedEntry {
    pub fn new(file_name: impl Into<OsString>, is_directory: bool) -> Self {
        let file_name = file_name.into();
        Self {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            is_directory,
        }
    }

    pub fn file(name: impl Into<OsString>) -> Self {
        Self::new(name, false)
    }

    pub fn directory(name: impl Into<OsString>) -> Self {
        Self::new(name, true)
    }

    /// Path of this entry inside `dir`.
    pub fn child_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.file_name)
    }

    /// Turns the entry into a record located inside `dir`.
    pub fn into_record(self, dir: &Path) -> PathRecord {
        PathRecord {
            full_path: dir.join(&self.file_name),
            name: self.name,
            is_directory: self.is_directory,
        }
    }

    /// True for the `.` and `..` pseudo-entries some platforms report.
    pub fn is_self_or_parent(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Lists the direct children of a directory.
///
/// Implementations are shared by every worker of a crawl, hence `Sync`.
pub trait DirectoryLister: Send + Sync {
    fn list(&self, path: &Path) -> io::Result<Vec<ListedEntry>>;
}

impl<L: DirectoryLister + ?Sized> DirectoryLister for &L {
    fn list(&self, path: &Path) -> io::Result<Vec<ListedEntry>> {
        (**self).list(path)
    }
}

/// Lister backed by `std::fs::read_dir`.
///
/// Symlinks are not followed: a link to a directory is reported as a file.
/// An error while iterating abandons the whole directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, path: &Path) -> io::Result<Vec<ListedEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            entries.push(ListedEntry::new(entry.file_name(), file_type.is_dir()));
        }
        Ok(entries)
    }
}
