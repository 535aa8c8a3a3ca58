//! The OS surface the drivers run against.
//!
//! [`Filesystem`] is the minimal set of calls the walkers need, each one
//! awaitable; [`OsFs`] implements it over `tokio::fs`, which offloads the
//! blocking syscalls to a worker pool. The drivers take `&dyn Filesystem`
//! so tests can wrap `OsFs` and inject failures.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

/// Metadata for one filesystem object.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// True for a real directory (never for a symlink under `lstat`).
    pub is_dir: bool,
    /// True for a regular file.
    pub is_file: bool,
    /// True for a symlink itself (only ever set by `lstat`).
    pub is_symlink: bool,
    /// Size in bytes.
    pub len: u64,
    /// Last modification time, if the filesystem reports one.
    pub modified: Option<SystemTime>,
}

impl From<std::fs::Metadata> for Metadata {
    fn from(meta: std::fs::Metadata) -> Metadata {
        Metadata {
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            is_symlink: meta.file_type().is_symlink(),
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

/// One entry from a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name, not a full path.
    pub name: String,
    /// Metadata of the entry itself, symlinks not followed.
    pub metadata: Metadata,
}

/// Abstract filesystem interface for the drivers.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Existence probe that does not follow symlinks.
    ///
    /// `Ok(false)` is a definite "not there"; `Err` means the OS refused
    /// to answer (permissions, I/O failure) and callers must not treat it
    /// as either answer.
    async fn probe(&self, path: &Path) -> io::Result<bool>;

    /// Metadata without following symlinks.
    async fn lstat(&self, path: &Path) -> io::Result<Metadata>;

    /// Metadata following symlinks.
    async fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// The target a symlink points at, unmodified.
    async fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// The entries of a directory, `.` and `..` excluded, sorted by name.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Create one directory level. Parents must already exist.
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Create a symlink at `link` pointing at `target`.
    async fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// The canonical path with every symlink resolved.
    async fn realpath(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real operating-system filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

#[async_trait]
impl Filesystem for OsFs {
    async fn probe(&self, path: &Path) -> io::Result<bool> {
        match fs::symlink_metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        fs::symlink_metadata(path).await.map(Metadata::from)
    }

    async fn stat(&self, path: &Path) -> io::Result<Metadata> {
        fs::metadata(path).await.map(Metadata::from)
    }

    async fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut dir = fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = fs::symlink_metadata(entry.path()).await?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                metadata: metadata.into(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).await
    }

    async fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        #[cfg(unix)]
        {
            fs::symlink(target, link).await
        }
        #[cfg(windows)]
        {
            fs::symlink_file(target, link).await
        }
    }

    async fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path).await
    }
}
