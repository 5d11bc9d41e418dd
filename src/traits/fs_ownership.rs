//! Owner and group changes.

use std::path::Path;

use crate::FsError;

/// The OS-level `chown` primitive.
///
/// Operates on **real** paths, i.e. the output of
/// [`FsPath::real_path`](super::FsPath::real_path), never on virtual ones.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsOwnership`.
pub trait FsOwnership: Send + Sync {
    /// Change the owner and/or group of `real_path`.
    ///
    /// `None` leaves the attribute untouched (the `-1` of `chown(2)`).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::PermissionDenied`] if the process may not give the file away
    fn set_owner(&self, real_path: &Path, uid: Option<u32>, gid: Option<u32>)
    -> Result<(), FsError>;
}
