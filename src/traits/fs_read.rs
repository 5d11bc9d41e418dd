//! Entry classification for permission walks.

use std::path::Path;

use crate::{FsError, Metadata};

/// Classify entries without following symlinks.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsRead`.
pub trait FsRead: Send + Sync {
    /// Get metadata without following symlinks.
    ///
    /// If `path` is a symlink, the symlink's own metadata is returned with
    /// [`FileType::Symlink`](crate::FileType::Symlink).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `path` does not exist
    fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError>;
}
