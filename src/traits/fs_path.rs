//! # FsPath Trait
//!
//! Translation from virtual paths to real on-disk paths.
//!
//! Ownership changes go through the operating system, which only knows
//! real paths. A direct backend answers with the path unchanged; a rooted
//! backend joins its base directory.

use std::path::{Component, Path, PathBuf};

use crate::FsError;

/// Real-path resolution.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsPath`.
pub trait FsPath: Send + Sync {
    /// Map a virtual path onto the underlying filesystem.
    ///
    /// # Errors
    ///
    /// - [`FsError::PathEscape`] if the path would leave the backend's root
    fn real_path(&self, path: &Path) -> Result<PathBuf, FsError>;
}

/// Normalize `.` and `..` lexically, anchored at `/`.
///
/// Unlike a plain lexical clean, `..` above the root is an error instead of
/// being clamped, so a confined backend can refuse the request.
pub(crate) fn normalize_virtual(path: &Path) -> Result<PathBuf, FsError> {
    let mut normalized = PathBuf::from("/");

    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(FsError::PathEscape {
                        path: path.to_path_buf(),
                    });
                }
            }
            Component::Normal(name) => normalized.push(name),
            Component::Prefix(_) => {
                return Err(FsError::PathEscape {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    Ok(normalized)
}
