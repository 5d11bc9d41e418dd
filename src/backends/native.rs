//! Direct access to the host filesystem.

use std::path::{Path, PathBuf};

use tracing::trace;

use super::{file_type_from_std, metadata_from_std, set_mode};
use crate::{
    DirEntry, FsDir, FsError, FsOwnership, FsPath, FsPermissions, FsRead, Metadata, Permissions,
    ReadDirIter,
};

/// Backend over the host filesystem with no path translation.
///
/// Virtual paths are host paths, so [`FsPath::real_path`] is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

impl NativeFs {
    /// Create a direct backend.
    pub fn new() -> Self {
        Self
    }
}

impl FsRead for NativeFs {
    fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        let md = std::fs::symlink_metadata(path)
            .map_err(|e| FsError::from_io("symlink_metadata", path, e))?;
        Ok(metadata_from_std(&md))
    }
}

impl FsDir for NativeFs {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let dir = path.to_path_buf();
        let iter = std::fs::read_dir(path).map_err(|e| FsError::from_io("read_dir", path, e))?;

        Ok(ReadDirIter::new(iter.map(move |entry| {
            let entry = entry.map_err(|e| FsError::from_io("read_dir", dir.clone(), e))?;
            let entry_path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| FsError::from_io("read_dir", entry_path.clone(), e))?;
            Ok(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry_path,
                file_type: file_type_from_std(file_type),
            })
        })))
    }
}

impl FsPermissions for NativeFs {
    fn set_permissions(&self, path: &Path, perm: Permissions) -> Result<(), FsError> {
        trace!(path = %path.display(), mode = %perm, "chmod");
        set_mode(path, perm).map_err(|e| FsError::from_io("chmod", path, e))
    }
}

impl FsOwnership for NativeFs {
    fn set_owner(
        &self,
        real_path: &Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), FsError> {
        trace!(path = %real_path.display(), ?uid, ?gid, "chown");
        std::os::unix::fs::lchown(real_path, uid, gid)
            .map_err(|e| FsError::from_io("chown", real_path, e))
    }
}

impl FsPath for NativeFs {
    fn real_path(&self, path: &Path) -> Result<PathBuf, FsError> {
        Ok(path.to_path_buf())
    }
}
