//! # Backend Traits
//!
//! The capability interface a backing store must offer for permission
//! propagation.
//!
//! ## Component Traits
//!
//! | Trait | Provides |
//! |-------|----------|
//! | [`FsRead`] | `symlink_metadata` (classification, mode, owner) |
//! | [`FsDir`] | `read_dir` |
//! | [`FsPermissions`] | `set_permissions` (chmod) |
//! | [`FsOwnership`] | `set_owner` (chown on a real path) |
//! | [`FsPath`] | `real_path` (virtual → real) |
//!
//! ## Blanket Implementation
//!
//! [`FsChange`] combines all five and is implemented automatically:
//!
//! ```text
//! FsRead + FsDir + FsPermissions + FsOwnership + FsPath = FsChange
//! ```
//!
//! ## Object Safety
//!
//! Every trait, including the composite, is object-safe:
//!
//! ```rust
//! use anyfs_permissions::FsChange;
//!
//! fn classify(fs: &dyn FsChange) -> bool {
//!     fs.symlink_metadata(std::path::Path::new("/srv")).is_ok()
//! }
//! ```

mod fs_dir;
mod fs_ownership;
mod fs_path;
mod fs_permissions;
mod fs_read;

pub use fs_dir::{FsDir, ReadDirIter};
pub use fs_ownership::FsOwnership;
pub use fs_path::FsPath;
pub use fs_permissions::FsPermissions;
pub use fs_read::FsRead;

pub(crate) use fs_path::normalize_virtual;

/// Everything the propagation engine needs from a backend.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type implementing all component traits.
/// Never implement `FsChange` directly.
pub trait FsChange: FsRead + FsDir + FsPermissions + FsOwnership + FsPath {}

impl<T: FsRead + FsDir + FsPermissions + FsOwnership + FsPath> FsChange for T {}

impl<T: FsRead + ?Sized> FsRead for Box<T> {
    fn symlink_metadata(&self, path: &std::path::Path) -> Result<crate::Metadata, crate::FsError> {
        (**self).symlink_metadata(path)
    }
}

impl<T: FsDir + ?Sized> FsDir for Box<T> {
    fn read_dir(&self, path: &std::path::Path) -> Result<ReadDirIter, crate::FsError> {
        (**self).read_dir(path)
    }
}

impl<T: FsPermissions + ?Sized> FsPermissions for Box<T> {
    fn set_permissions(
        &self,
        path: &std::path::Path,
        perm: crate::Permissions,
    ) -> Result<(), crate::FsError> {
        (**self).set_permissions(path, perm)
    }
}

impl<T: FsOwnership + ?Sized> FsOwnership for Box<T> {
    fn set_owner(
        &self,
        real_path: &std::path::Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), crate::FsError> {
        (**self).set_owner(real_path, uid, gid)
    }
}

impl<T: FsPath + ?Sized> FsPath for Box<T> {
    fn real_path(&self, path: &std::path::Path) -> Result<std::path::PathBuf, crate::FsError> {
        (**self).real_path(path)
    }
}
