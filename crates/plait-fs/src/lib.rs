//! plait-fs: cycle-safe filesystem operations over kinded path terms.
//!
//! This crate interprets `plait-path` terms against a real filesystem:
//!
//! - **exists**: tri-valued existence (`Yes` / `No` / `Unknown`), symlink
//!   loop safe, never follows a link it was told to treat literally
//! - **mkdir**: idempotent multi-level directory creation that also
//!   materializes the symlinks a path declares
//! - **fold**: prefix-order directory walk reporting raw objects
//! - **fold_follows_links**: the symlink-following variant, flagging
//!   objects whose resolved path was already seen
//! - **find_item**: first directory in which an item exists
//!
//! Every filesystem call is awaitable; [`OsFs`] delegates to `tokio::fs`,
//! which runs the blocking syscalls on a worker pool. Dropping a returned
//! future between awaits stops the walk; partial `mkdir` progress is not
//! rolled back.

mod cursor;
mod error;
mod exists;
mod fold;
mod follow;
mod fsio;
mod mkdir;
mod tri;

pub use error::{Error, Result};
pub use exists::{exists, find_item, lstat, stat};
pub use fold::{fold, FoldEvent};
pub use follow::{fold_follows_links, FollowEvent};
pub use fsio::{DirEntry, Filesystem, Metadata, OsFs};
pub use mkdir::mkdir;
pub use tri::Tri;
