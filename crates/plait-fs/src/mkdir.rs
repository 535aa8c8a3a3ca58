//! Recursive materialization of a directory path, embedded symlinks
//! included.

use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;

use plait_path::{AbsDir, Item, Term};

use crate::cursor::CursorSet;
use crate::error::{Error, Result};
use crate::fsio::Filesystem;

/// Create every level of an absolute directory path.
///
/// Each `Dir` item is created only when absent, one level at a time, so a
/// second run over the same path succeeds without touching anything. A
/// `Link` item is created unconditionally and the walk then continues
/// through its declared target, materializing that too; an entry already
/// sitting where the link should go makes the call fail. Nothing already
/// created is rolled back on failure.
pub async fn mkdir(fs: &dyn Filesystem, path: &AbsDir) -> Result<()> {
    match path.term().split_first() {
        (_, None) => Ok(()), // the root itself
        (_, Some(rel)) => {
            let mut cursors = CursorSet::new();
            walk(fs, AbsDir::root(), rel.clone(), &mut cursors).await
        }
    }
}

fn walk<'a>(
    fs: &'a dyn Filesystem,
    prefix: AbsDir,
    remaining: Term,
    cursors: &'a mut CursorSet,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if !cursors.insert(prefix.term(), &remaining) {
            // Already materializing this prefix/remainder pair higher up.
            return Ok(());
        }

        let (head, rest) = remaining.split_first();
        let head = head.clone();
        let rest = rest.cloned();

        match head {
            Item::Root => match rest {
                None => Ok(()),
                Some(rest) => walk(fs, AbsDir::root(), rest, cursors).await,
            },

            Item::Dot => match rest {
                None => Ok(()),
                Some(rest) => walk(fs, prefix, rest, cursors).await,
            },

            Item::Dotdot => {
                let up = prefix.parent();
                match rest {
                    None => Ok(()),
                    Some(rest) => walk(fs, up, rest, cursors).await,
                }
            }

            Item::Dir(name) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let present = fs
                    .probe(&at)
                    .await
                    .map_err(|err| Error::io(format!("probe {}", at.display()), err))?;
                if present {
                    tracing::debug!(path = %at.display(), "level already present");
                } else {
                    fs.mkdir(&at)
                        .await
                        .map_err(|err| Error::io(format!("mkdir {}", at.display()), err))?;
                    tracing::debug!(path = %at.display(), "created directory");
                }
                match rest {
                    None => Ok(()),
                    Some(rest) => walk(fs, prefix.child_dir(name), rest, cursors).await,
                }
            }

            Item::Link(name, target) => {
                let at = prefix.to_path_buf().join(name.as_str());
                let target_os = PathBuf::from(target.to_string());
                // No probe first: an entry already sitting here, symlink or
                // not, surfaces as the symlink call's failure.
                fs.symlink(&target_os, &at).await.map_err(|err| {
                    Error::io(
                        format!("symlink {} -> {}", at.display(), target_os.display()),
                        err,
                    )
                })?;
                tracing::debug!(
                    link = %at.display(),
                    target = %target_os.display(),
                    "created symlink"
                );
                let remaining = match rest {
                    Some(rest) => target.concat(&rest),
                    None => (*target).clone(),
                };
                walk(fs, prefix, remaining, cursors).await
            }

            Item::File(_) | Item::BrokenLink(..) => {
                Err(Error::other("file item in a directory path"))
            }
        }
    }
    .boxed()
}
