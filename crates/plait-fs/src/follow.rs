//! Link-following fold with revisit detection.
//!
//! Unlike [`crate::fold`], symlinked directories are descended into. Every
//! object is resolved through `realpath`; two sets keep the walk finite:
//! paths already reported are skipped outright, and resolved paths already
//! seen mark their later appearances with `already_seen`. Children are
//! addressed under their parent's *resolved* path, so a symlink loop
//! converges onto paths the walk has already reported and stops.

use std::collections::HashSet;
use std::path::Path;

use futures::future::BoxFuture;
use futures::FutureExt;

use plait_path::{AbsDir, AbsFile, AnyPath, Item, Name};

use crate::error::{Error, Result};
use crate::fold::{parse_dir_target, parse_file_target};
use crate::fsio::Filesystem;

/// One object reported by [`fold_follows_links`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEvent {
    /// The absolute path by which the walk reached the object.
    pub path: AnyPath,
    /// The object's canonical path, every symlink resolved.
    pub resolved: AnyPath,
    /// True when the resolved path was already reported under another
    /// name earlier in this walk.
    pub already_seen: bool,
}

/// Walk a tree following symlinks, reporting each reachable object with
/// its resolved path and whether that resolved path is a revisit.
pub async fn fold_follows_links<Acc, F>(
    fs: &dyn Filesystem,
    start: &AbsDir,
    init: Acc,
    f: F,
) -> Result<Acc>
where
    Acc: Send,
    F: FnMut(Acc, FollowEvent) -> Result<Acc> + Send,
{
    let start_os = start.to_path_buf();
    match fs.probe(&start_os).await {
        Ok(true) => {}
        Ok(false) => return Err(Error::not_found(start.to_string())),
        Err(err) => return Err(Error::io(format!("probe {}", start_os.display()), err)),
    }

    let resolved_os = fs
        .realpath(&start_os)
        .await
        .map_err(|err| Error::io(format!("realpath {}", start_os.display()), err))?;
    let resolved = abs_dir_of_os(&resolved_os)?;

    let mut walk = FollowWalk {
        fs,
        f,
        visited: HashSet::new(),
        resolved_visited: HashSet::new(),
    };
    let acc = walk.emit_start(start.clone(), resolved.clone(), init)?;
    walk.walk_dir(resolved, acc).await
}

struct FollowWalk<'a, F> {
    fs: &'a dyn Filesystem,
    f: F,
    /// Paths already reported; a hit skips the object entirely.
    visited: HashSet<AnyPath>,
    /// Resolved paths already seen; a hit flags `already_seen`.
    resolved_visited: HashSet<AnyPath>,
}

impl<F> FollowWalk<'_, F> {
    fn emit_start<Acc>(&mut self, start: AbsDir, resolved: AbsDir, acc: Acc) -> Result<Acc>
    where
        F: FnMut(Acc, FollowEvent) -> Result<Acc>,
    {
        let (acc, _) = self.emit(start.into(), resolved.into(), acc)?;
        Ok(acc)
    }

    /// Report one object unless its path was already reported. Returns the
    /// accumulator and whether the object was fresh, which is what decides
    /// descent for directories.
    fn emit<Acc>(&mut self, logical: AnyPath, resolved: AnyPath, acc: Acc) -> Result<(Acc, bool)>
    where
        F: FnMut(Acc, FollowEvent) -> Result<Acc>,
    {
        if self.visited.contains(&logical) {
            return Ok((acc, false));
        }
        let already_seen = self.resolved_visited.contains(&resolved);
        let event = FollowEvent {
            path: logical.clone(),
            resolved: resolved.clone(),
            already_seen,
        };
        let acc = (self.f)(acc, event)?;
        self.visited.insert(logical);
        self.resolved_visited.insert(resolved);
        Ok((acc, true))
    }

    fn walk_dir<'s, Acc>(&'s mut self, dir: AbsDir, acc: Acc) -> BoxFuture<'s, Result<Acc>>
    where
        Acc: Send + 's,
        F: FnMut(Acc, FollowEvent) -> Result<Acc> + Send,
    {
        async move {
            let dir_os = dir.to_path_buf();
            let entries = self
                .fs
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
                let bad_entry =
                    |_: plait_path::PathError| Error::invalid_entry(&entry.name, &dir_display);
                let at = dir_os.join(name.as_str());

                if entry.metadata.is_symlink {
                    let target_os = self
                        .fs
                        .read_link(&at)
                        .await
                        .map_err(|err| Error::io(format!("readlink {}", at.display()), err))?;
                    let target_str = target_os.to_string_lossy().into_owned();

                    match self.fs.stat(&at).await {
                        Ok(meta) if meta.is_dir => {
                            let target = parse_dir_target(&target_str).map_err(bad_entry)?;
                            let logical = AbsDir::from_term(
                                dir.term().push(Item::Link(name, Box::new(target))),
                            )
                            .map_err(bad_entry)?;
                            acc = self.enter_dir(logical, &at, acc).await?;
                        }
                        Ok(_) => {
                            let target = parse_file_target(&target_str).map_err(bad_entry)?;
                            let logical = AbsFile::from_term(
                                dir.term().push(Item::Link(name, Box::new(target))),
                            )
                            .map_err(bad_entry)?;
                            acc = self.emit_leaf(logical.into(), &at, acc).await?;
                        }
                        Err(_) => {
                            // The target does not resolve, so realpath has
                            // nothing to say: the parent is already
                            // canonical, attach the basename to it.
                            let parts =
                                target_str.split('/').map(str::to_string).collect();
                            let logical = AbsFile::from_term(
                                dir.term()
                                    .push(Item::BrokenLink(name.clone(), parts)),
                            )
                            .map_err(bad_entry)?;
                            let resolved = dir.child_file(name);
                            let (next, _) =
                                self.emit(logical.into(), resolved.into(), acc)?;
                            acc = next;
                        }
                    }
                } else if entry.metadata.is_dir {
                    let logical = dir.child_dir(name);
                    acc = self.enter_dir(logical, &at, acc).await?;
                } else {
                    let logical = dir.child_file(name);
                    acc = self.emit_leaf(logical.into(), &at, acc).await?;
                }
            }
            Ok(acc)
        }
        .boxed()
    }

    /// Report a directory and descend into it through its resolved path.
    /// Descent happens even when `already_seen` is set; the visited set is
    /// what keeps revisited subtrees from being reported twice.
    async fn enter_dir<Acc>(&mut self, logical: AbsDir, at: &Path, acc: Acc) -> Result<Acc>
    where
        Acc: Send,
        F: FnMut(Acc, FollowEvent) -> Result<Acc> + Send,
    {
        if self.visited.contains(&AnyPath::from(logical.clone())) {
            return Ok(acc);
        }
        let resolved_os = self
            .fs
            .realpath(at)
            .await
            .map_err(|err| Error::io(format!("realpath {}", at.display()), err))?;
        let resolved = abs_dir_of_os(&resolved_os)?;
        let (acc, fresh) = self.emit(logical.into(), resolved.clone().into(), acc)?;
        if fresh {
            return self.walk_dir(resolved, acc).await;
        }
        Ok(acc)
    }

    async fn emit_leaf<Acc>(&mut self, logical: AnyPath, at: &Path, acc: Acc) -> Result<Acc>
    where
        Acc: Send,
        F: FnMut(Acc, FollowEvent) -> Result<Acc> + Send,
    {
        if self.visited.contains(&logical) {
            return Ok(acc);
        }
        let resolved_os = self
            .fs
            .realpath(at)
            .await
            .map_err(|err| Error::io(format!("realpath {}", at.display()), err))?;
        let resolved = abs_file_of_os(&resolved_os)?;
        let (acc, _) = self.emit(logical, resolved.into(), acc)?;
        Ok(acc)
    }
}

fn abs_dir_of_os(path: &Path) -> Result<AbsDir> {
    plait_path::abs_dir(&path.to_string_lossy())
        .map_err(|_| Error::other(format!("unrepresentable canonical path {}", path.display())))
}

fn abs_file_of_os(path: &Path) -> Result<AbsFile> {
    plait_path::abs_file(&path.to_string_lossy())
        .map_err(|_| Error::other(format!("unrepresentable canonical path {}", path.display())))
}
