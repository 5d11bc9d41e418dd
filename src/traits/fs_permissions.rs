//! Mode changes.

use std::path::Path;

use crate::{FsError, Permissions};

/// The `chmod` primitive.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsPermissions`.
///
/// # Note
///
/// Reading permissions is done via [`FsRead::symlink_metadata`](super::FsRead::symlink_metadata).
pub trait FsPermissions: Send + Sync {
    /// Set permissions on a file or directory.
    ///
    /// Callers never pass a symlink; backends may follow one if they do.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::PermissionDenied`] if the caller may not change the mode
    fn set_permissions(&self, path: &Path, perm: Permissions) -> Result<(), FsError>;
}
