//! Prefix-order directory fold.
//!
//! Objects are reported as typed relative paths from the start directory;
//! the tail item says what was found. On-disk symlinks are **reified**:
//! the raw entry becomes a `Link` item carrying its parsed target when the
//! target resolves, and a `BrokenLink` item carrying the raw target pieces
//! when it does not.

use futures::future::BoxFuture;
use futures::FutureExt;

use plait_path::{AbsDir, AnyPath, Item, Name, PathError, RelDir, RelFile, Term};

use crate::error::{Error, Result};
use crate::fsio::Filesystem;

/// One object discovered by [`fold`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldEvent {
    /// A real directory, or a live symlink to one.
    Dir(RelDir),
    /// A file-shaped object: regular files, devices, sockets, FIFOs, and
    /// live symlinks to files.
    File(RelFile),
    /// A symlink whose target does not resolve.
    BrokenLink(RelFile),
}

impl FoldEvent {
    /// The event's relative path, kinds erased.
    pub fn path(&self) -> AnyPath {
        match self {
            FoldEvent::Dir(p) => p.clone().into(),
            FoldEvent::File(p) | FoldEvent::BrokenLink(p) => p.clone().into(),
        }
    }
}

/// Walk a directory tree in prefix order, threading an accumulator.
///
/// The start directory itself is reported first, as a `Dir` event at `.`.
/// Children are visited in listing order; only real directories are
/// descended into, so a symlinked directory is a leaf here and the walk
/// needs no cycle bookkeeping. Callback errors abort the walk.
pub async fn fold<Acc, F>(fs: &dyn Filesystem, start: &AbsDir, init: Acc, mut f: F) -> Result<Acc>
where
    Acc: Send,
    F: FnMut(Acc, &AbsDir, FoldEvent) -> Result<Acc> + Send,
{
    let start_os = start.to_path_buf();
    match fs.probe(&start_os).await {
        Ok(true) => {}
        Ok(false) => return Err(Error::not_found(start.to_string())),
        Err(err) => return Err(Error::io(format!("probe {}", start_os.display()), err)),
    }

    let acc = f(init, start, FoldEvent::Dir(RelDir::current()))?;
    walk(fs, start, None, acc, &mut f).await
}

fn walk<'a, Acc, F>(
    fs: &'a dyn Filesystem,
    start: &'a AbsDir,
    dir_rel: Option<RelDir>,
    acc: Acc,
    f: &'a mut F,
) -> BoxFuture<'a, Result<Acc>>
where
    Acc: Send + 'a,
    F: FnMut(Acc, &AbsDir, FoldEvent) -> Result<Acc> + Send + 'a,
{
    async move {
        let dir_os = match &dir_rel {
            None => start.to_path_buf(),
            Some(rel) => start.to_path_buf().join(rel.to_path_buf()),
        };
        let entries = fs
            .read_dir(&dir_os)
            .await
            .map_err(|err| Error::io(format!("read_dir {}", dir_os.display()), err))?;

        let mut acc = acc;
        for entry in entries {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            let dir_display = dir_os.display().to_string();
            let name = Name::new(entry.name.as_str())
                .map_err(|_| Error::invalid_entry(&entry.name, &dir_display))?;
            let bad_entry = |_: PathError| Error::invalid_entry(&entry.name, &dir_display);

            if entry.metadata.is_symlink {
                let at = dir_os.join(name.as_str());
                let target_os = fs
                    .read_link(&at)
                    .await
                    .map_err(|err| Error::io(format!("readlink {}", at.display()), err))?;
                let target_str = target_os.to_string_lossy().into_owned();

                match fs.stat(&at).await {
                    Ok(meta) if meta.is_dir => {
                        let target = parse_dir_target(&target_str).map_err(bad_entry)?;
                        let item = Item::Link(name, Box::new(target));
                        let rel = RelDir::from_term(child_term(dir_rel.as_ref(), item))
                            .map_err(bad_entry)?;
                        acc = f(acc, start, FoldEvent::Dir(rel))?;
                    }
                    Ok(_) => {
                        let target = parse_file_target(&target_str).map_err(bad_entry)?;
                        let item = Item::Link(name, Box::new(target));
                        let rel = RelFile::from_term(child_term(dir_rel.as_ref(), item))
                            .map_err(bad_entry)?;
                        acc = f(acc, start, FoldEvent::File(rel))?;
                    }
                    Err(_) => {
                        // Dangling or looping: keep the raw target pieces.
                        let parts = target_str.split('/').map(str::to_string).collect();
                        let item = Item::BrokenLink(name, parts);
                        let rel = RelFile::from_term(child_term(dir_rel.as_ref(), item))
                            .map_err(bad_entry)?;
                        acc = f(acc, start, FoldEvent::BrokenLink(rel))?;
                    }
                }
            } else if entry.metadata.is_dir {
                let rel = RelDir::from_term(child_term(dir_rel.as_ref(), Item::Dir(name)))
                    .map_err(bad_entry)?;
                acc = f(acc, start, FoldEvent::Dir(rel.clone()))?;
                acc = walk(fs, start, Some(rel), acc, &mut *f).await?;
            } else {
                let rel = RelFile::from_term(child_term(dir_rel.as_ref(), Item::File(name)))
                    .map_err(bad_entry)?;
                acc = f(acc, start, FoldEvent::File(rel))?;
            }
        }
        Ok(acc)
    }
    .boxed()
}

fn child_term(prefix: Option<&RelDir>, item: Item) -> Term {
    match prefix {
        None => Term::Item(item),
        Some(rel) => rel.term().push(item),
    }
}

pub(crate) fn parse_dir_target(target: &str) -> std::result::Result<Term, PathError> {
    if target.starts_with('/') {
        plait_path::abs_dir(target).map(|p| p.into_term())
    } else {
        plait_path::rel_dir(target).map(|p| p.into_term())
    }
}

pub(crate) fn parse_file_target(target: &str) -> std::result::Result<Term, PathError> {
    if target.starts_with('/') {
        plait_path::abs_file(target).map(|p| p.into_term())
    } else {
        plait_path::rel_file(target).map(|p| p.into_term())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsio::OsFs;
    use std::env;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        env::temp_dir().join(format!("plait-fold-{}-{}", std::process::id(), id))
    }

    async fn setup() -> PathBuf {
        let dir = temp_dir();
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    async fn cleanup(dir: &Path) {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    fn abs(path: &Path) -> AbsDir {
        plait_path::abs_dir(&path.to_string_lossy()).unwrap()
    }

    async fn collect_paths(start: &AbsDir) -> Vec<String> {
        fold(&OsFs, start, Vec::new(), |mut acc, _root, event| {
            acc.push(event.path().to_string());
            Ok(acc)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn missing_start_is_not_found() {
        let dir = setup().await;
        let gone = abs(&dir.join("gone"));
        let err = fold(&OsFs, &gone, (), |_, _, _| Ok(())).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        cleanup(&dir).await;
    }

    #[tokio::test]
    async fn reports_the_start_then_each_object_once() {
        let dir = setup().await;
        tokio::fs::create_dir_all(dir.join("a/b")).await.unwrap();
        tokio::fs::write(dir.join("a/f"), b"x").await.unwrap();
        tokio::fs::write(dir.join("g"), b"y").await.unwrap();

        let mut paths = collect_paths(&abs(&dir)).await;
        paths.sort();
        assert_eq!(paths, [".", "a", "a/b", "a/f", "g"]);

        cleanup(&dir).await;
    }

    #[tokio::test]
    async fn parents_come_before_children() {
        let dir = setup().await;
        tokio::fs::create_dir_all(dir.join("a/b/c")).await.unwrap();

        let paths = collect_paths(&abs(&dir)).await;
        let pos = |needle: &str| paths.iter().position(|p| p == needle).unwrap();
        assert!(pos(".") < pos("a"));
        assert!(pos("a") < pos("a/b"));
        assert!(pos("a/b") < pos("a/b/c"));

        cleanup(&dir).await;
    }

    #[tokio::test]
    async fn symlinked_directories_are_leaves() {
        let dir = setup().await;
        tokio::fs::create_dir(dir.join("real")).await.unwrap();
        tokio::fs::write(dir.join("real/inner"), b"x").await.unwrap();
        OsFs.symlink(Path::new("real"), &dir.join("alias"))
            .await
            .unwrap();

        let events = fold(&OsFs, &abs(&dir), Vec::new(), |mut acc, _root, event| {
            acc.push(event);
            Ok(acc)
        })
        .await
        .unwrap();

        // alias shows up as a dir-shaped link, but only real/ is descended:
        // its inner file appears exactly once.
        let inner: Vec<_> = events
            .iter()
            .filter(|e| e.path().to_string().ends_with("inner"))
            .collect();
        assert_eq!(inner.len(), 1);
        let alias = events
            .iter()
            .find(|e| e.path().to_string() == "alias")
            .unwrap();
        assert!(matches!(alias, FoldEvent::Dir(p)
            if matches!(p.last(), Item::Link(..))));

        cleanup(&dir).await;
    }

    #[tokio::test]
    async fn callback_errors_abort_the_walk() {
        let dir = setup().await;
        tokio::fs::write(dir.join("f"), b"x").await.unwrap();

        let err = fold(&OsFs, &abs(&dir), 0u32, |count, _root, _event| {
            if count == 1 {
                Err(Error::other("stop here"))
            } else {
                Ok(count + 1)
            }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Other { .. }));

        cleanup(&dir).await;
    }
}
