//! # Propagation Engine
//!
//! Applies a [`ChangeSpec`] to a tree.
//!
//! ## Per-entry rules
//!
//! Evaluated in order for every entry the walker produces:
//!
//! 1. **Recursion boundary**: when the change is not recursive, every entry
//!    but the root is skipped, and directories are not descended into.
//! 2. **Symlink skip**: symlinks are never mutated or followed.
//! 3. **Mutation**: mode first, then ownership. Ownership goes through
//!    [`FsPath::real_path`](crate::FsPath::real_path) because `chown` runs
//!    against the real filesystem.
//!
//! ## Failure
//!
//! The first failing operation aborts the walk. Entries changed before the
//! failure keep their new mode and owner; there is no rollback. Callers must
//! assume an aborted walk changed some prefix of the pre-order sequence.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::guard::ensure_not_symlink;
use crate::traits::FsChange;
use crate::walk::{WalkControl, walk};
use crate::{ChangeError, ChangeSpec, FileType, WalkEntry};

/// What the engine does with one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Leave the entry alone; carry the walk decision for its subtree.
    Skip(WalkControl),
    /// Apply the spec to the entry and continue.
    Mutate,
}

/// Decide what to do with `entry` under `spec`.
///
/// Pure; performs no I/O.
///
/// ```rust
/// use anyfs_permissions::{decide, ChangeSpec, EntryAction, FileType, Permissions, WalkControl, WalkEntry};
/// use std::path::PathBuf;
///
/// let spec = ChangeSpec::new(Some(Permissions::from_mode(0o700)), None, None, false).unwrap();
/// let child = WalkEntry {
///     path: PathBuf::from("/r/sub"),
///     file_type: FileType::Directory,
///     permissions: Permissions::default_dir(),
///     depth: 1,
/// };
/// assert_eq!(decide(&child, &spec), EntryAction::Skip(WalkControl::SkipSubtree));
/// ```
pub fn decide(entry: &WalkEntry, spec: &ChangeSpec) -> EntryAction {
    if !entry.is_root() && !spec.recursive() {
        return EntryAction::Skip(match entry.file_type {
            FileType::File => WalkControl::Continue,
            FileType::Directory | FileType::Symlink => WalkControl::SkipSubtree,
        });
    }

    if spec.skip_symlinks() && entry.file_type == FileType::Symlink {
        return EntryAction::Skip(WalkControl::SkipSubtree);
    }

    EntryAction::Mutate
}

/// Result of a walk that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// Entries whose mode and/or owner were set.
    pub mutated: usize,
    /// Entries visited but left alone.
    pub skipped: usize,
}

/// Walks a backend and applies a spec.
///
/// Holds a borrowed backend; cheap to create per request.
///
/// # Example
///
/// ```rust,no_run
/// use anyfs_permissions::{ChangeSpec, NativeFs, Permissions, PropagationEngine};
/// use std::path::Path;
///
/// let spec = ChangeSpec::new(Some(Permissions::from_mode(0o750)), None, None, true)?;
/// let fs = NativeFs::new();
/// let summary = PropagationEngine::new(&fs).apply(Path::new("/srv/share"), &spec)?;
/// println!("changed {} entries", summary.mutated);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct PropagationEngine<'a, F: ?Sized> {
    fs: &'a F,
}

impl<'a, F: FsChange + ?Sized> PropagationEngine<'a, F> {
    /// Create an engine over `fs`.
    pub fn new(fs: &'a F) -> Self {
        Self { fs }
    }

    /// Refuse a symlink root, then propagate.
    ///
    /// # Errors
    ///
    /// - [`ChangeError::SymlinkRoot`] if `root` is a symlink; nothing is changed
    /// - [`ChangeError::Io`] for the first failing backend call; earlier
    ///   entries stay changed
    pub fn apply(&self, root: &Path, spec: &ChangeSpec) -> Result<ApplySummary, ChangeError> {
        ensure_not_symlink(self.fs, root)?;
        self.propagate(root, spec)
    }

    /// Propagate without the symlink-root check.
    ///
    /// Callers must have run [`ensure_not_symlink`] on `root` already. A
    /// symlink root is still never mutated here; it is simply skipped.
    ///
    /// # Errors
    ///
    /// [`ChangeError::Io`] for the first failing backend call.
    pub fn propagate(&self, root: &Path, spec: &ChangeSpec) -> Result<ApplySummary, ChangeError> {
        let mut summary = ApplySummary::default();

        let result = walk(self.fs, root, |entry| match decide(entry, spec) {
            EntryAction::Skip(control) => {
                debug!(path = %entry.path.display(), "skipped");
                summary.skipped += 1;
                Ok(control)
            }
            EntryAction::Mutate => {
                self.mutate(entry, spec)?;
                summary.mutated += 1;
                Ok(WalkControl::Continue)
            }
        });

        match result {
            Ok(()) => {
                info!(
                    root = %root.display(),
                    mutated = summary.mutated,
                    skipped = summary.skipped,
                    "permission walk completed"
                );
                Ok(summary)
            }
            Err(err) => {
                warn!(
                    root = %root.display(),
                    mutated = summary.mutated,
                    error = %err,
                    "permission walk aborted; changed entries are not rolled back"
                );
                Err(err)
            }
        }
    }

    fn mutate(&self, entry: &WalkEntry, spec: &ChangeSpec) -> Result<(), ChangeError> {
        if let Some(mode) = spec.mode() {
            self.fs.set_permissions(&entry.path, mode)?;
        }

        if spec.changes_ownership() {
            let real = self.fs.real_path(&entry.path)?;
            self.fs.set_owner(&real, spec.owner(), spec.group())?;
        }

        debug!(
            path = %entry.path.display(),
            mode = ?spec.mode().map(|m| m.to_string()),
            uid = ?spec.owner(),
            gid = ?spec.group(),
            "applied"
        );
        Ok(())
    }
}

/// Refuse a symlink root and apply `spec` to `root` (and its subtree when
/// recursive).
///
/// Shorthand for [`PropagationEngine::apply`].
///
/// # Errors
///
/// See [`PropagationEngine::apply`].
pub fn apply_permissions<F>(
    fs: &F,
    root: &Path,
    spec: &ChangeSpec,
) -> Result<ApplySummary, ChangeError>
where
    F: FsChange + ?Sized,
{
    PropagationEngine::new(fs).apply(root, spec)
}
