//! The tri-valued existence oracle.
//!
//! `exists` interprets a typed absolute path against the filesystem one
//! item at a time, never following a symlink it was told to treat
//! literally. I/O failures fold into [`Tri::Unknown`] instead of erroring:
//! "permission denied" means the walk cannot tell, not that the object is
//! absent.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;

use plait_path::{Abs, AbsDir, Item, Object, Path as TypedPath, Rel, Term};

use crate::cursor::CursorSet;
use crate::error::{Error, Result};
use crate::fsio::{Filesystem, Metadata};
use crate::tri::Tri;

/// Does this absolute path, interpreted literally, exist?
///
/// A `Dir` or `File` item must be a real directory or file at that name; a
/// `Link` item must be a symlink whose target term itself exists; a
/// `BrokenLink` item must be a symlink whose raw target does not resolve.
/// A remainder the walk has already entered answers `Yes` instead of
/// looping.
pub async fn exists<O: Object>(fs: &dyn Filesystem, path: &TypedPath<Abs, O>) -> Tri {
    let rooted = probe_tri(fs, Path::new("/")).await;
    if rooted != Tri::Yes {
        return rooted;
    }
    match path.term().split_first() {
        (_, None) => Tri::Yes, // the root itself
        (_, Some(rel)) => {
            let mut cursors = CursorSet::new();
            walk(fs, AbsDir::root(), rel.clone(), &mut cursors).await
        }
    }
}

/// The first directory under which `item` exists, if any.
pub async fn find_item<O: Object>(
    fs: &dyn Filesystem,
    item: &TypedPath<Rel, O>,
    dirs: &[AbsDir],
) -> Option<AbsDir> {
    for dir in dirs {
        if exists(fs, &dir.concat(item)).await.is_yes() {
            return Some(dir.clone());
        }
    }
    None
}

/// Metadata of the object itself, symlinks not followed.
pub async fn lstat<O: Object>(fs: &dyn Filesystem, path: &TypedPath<Abs, O>) -> Result<Metadata> {
    let at = path.to_path_buf();
    fs.lstat(&at)
        .await
        .map_err(|err| Error::io(format!("lstat {}", at.display()), err))
}

/// Metadata of the object a path resolves to, symlinks followed.
pub async fn stat<O: Object>(fs: &dyn Filesystem, path: &TypedPath<Abs, O>) -> Result<Metadata> {
    let at = path.to_path_buf();
    fs.stat(&at)
        .await
        .map_err(|err| Error::io(format!("stat {}", at.display()), err))
}

fn walk<'a>(
    fs: &'a dyn Filesystem,
    prefix: AbsDir,
    remaining: Term,
    cursors: &'a mut CursorSet,
) -> BoxFuture<'a, Tri> {
    async move {
        if !cursors.insert(prefix.term(), &remaining) {
            // This prefix/remainder pair is already being checked further
            // up the walk; retracing it can only loop.
            return Tri::Yes;
        }

        let (head, rest) = remaining.split_first();
        let head = head.clone();
        let rest = rest.cloned();

        match head {
            Item::Root => {
                // An absolute link target restarted the walk.
                let rooted = probe_tri(fs, Path::new("/")).await;
                if rooted != Tri::Yes {
                    return rooted;
                }
                match rest {
                    None => Tri::Yes,
                    Some(rest) => walk(fs, AbsDir::root(), rest, cursors).await,
                }
            }

            Item::Dot => match rest {
                None => Tri::Yes,
                Some(rest) => walk(fs, prefix, rest, cursors).await,
            },

            Item::Dotdot => {
                let up = prefix.parent();
                match rest {
                    None => Tri::Yes,
                    Some(rest) => walk(fs, up, rest, cursors).await,
                }
            }

            Item::Dir(name) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let present = probe_tri(fs, &at).await;
                if present != Tri::Yes {
                    return present;
                }
                let kind = lstat_tri(fs, &at, |meta| meta.is_dir).await;
                if kind != Tri::Yes {
                    return kind;
                }
                match rest {
                    None => Tri::Yes,
                    Some(rest) => walk(fs, prefix.child_dir(name), rest, cursors).await,
                }
            }

            Item::File(name) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let present = probe_tri(fs, &at).await;
                if present != Tri::Yes {
                    return present;
                }
                lstat_tri(fs, &at, |meta| meta.is_file).await
            }

            Item::Link(name, target) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let is_link = lstat_tri(fs, &at, |meta| meta.is_symlink).await;
                if is_link != Tri::Yes {
                    return is_link;
                }
                // The declared target stands in for the link: a relative
                // target continues from this prefix, an absolute one comes
                // back in through the Root arm.
                let remaining = match rest {
                    Some(rest) => target.concat(&rest),
                    None => (*target).clone(),
                };
                walk(fs, prefix, remaining, cursors).await
            }

            Item::BrokenLink(name, parts) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let entry = lstat_tri(fs, &at, |meta| meta.is_symlink).await;
                if entry == Tri::No {
                    return Tri::No;
                }
                let target = parts.join("/");
                let target_path = if target.starts_with('/') {
                    PathBuf::from(&target)
                } else {
                    prefix.to_path_buf().join(&target)
                };
                let target_gone = stat_probe_tri(fs, &target_path).await.negate();
                entry.and(target_gone)
            }
        }
    }
    .boxed()
}

async fn probe_tri(fs: &dyn Filesystem, path: &Path) -> Tri {
    match fs.probe(path).await {
        Ok(true) => Tri::Yes,
        Ok(false) => Tri::No,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "probe could not answer");
            Tri::Unknown
        }
    }
}

async fn lstat_tri<F>(fs: &dyn Filesystem, path: &Path, want: F) -> Tri
where
    F: FnOnce(&Metadata) -> bool,
{
    match fs.lstat(path).await {
        Ok(meta) => want(&meta).into(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Tri::No,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "lstat could not answer");
            Tri::Unknown
        }
    }
}

/// Whether `err` is `ELOOP` ("too many levels of symbolic links").
#[cfg(unix)]
fn is_symlink_loop(err: &io::Error) -> bool {
    const ELOOP: i32 = 40;
    err.raw_os_error() == Some(ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_loop(_err: &io::Error) -> bool {
    false
}

/// Existence with symlinks followed, for broken-link targets. A target
/// lost in a symlink loop is as dead as a missing one.
async fn stat_probe_tri(fs: &dyn Filesystem, path: &Path) -> Tri {
    match fs.stat(path).await {
        Ok(_) => Tri::Yes,
        Err(err) if err.kind() == io::ErrorKind::NotFound || is_symlink_loop(&err) => {
            Tri::No
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "stat could not answer");
            Tri::Unknown
        }
    }
}
