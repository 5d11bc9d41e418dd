//! Concrete backends.
//!
//! | Backend | Virtual path | Real path |
//! |---------|--------------|-----------|
//! | [`NativeFs`] | host path | same as virtual |
//! | [`RootedFs`] | `/` = base directory | `base` + normalized virtual path |
//!
//! Both read metadata with `lstat` semantics so symlinks are classified,
//! never followed.

mod native;
mod rooted;

pub use native::NativeFs;
pub use rooted::RootedFs;

use std::os::unix::fs::MetadataExt;

use crate::{FileType, Metadata, Permissions};

pub(crate) fn file_type_from_std(file_type: std::fs::FileType) -> FileType {
    if file_type.is_symlink() {
        FileType::Symlink
    } else if file_type.is_dir() {
        FileType::Directory
    } else {
        FileType::File
    }
}

pub(crate) fn metadata_from_std(md: &std::fs::Metadata) -> Metadata {
    Metadata {
        file_type: file_type_from_std(md.file_type()),
        permissions: Permissions::from_mode(md.mode()),
        uid: md.uid(),
        gid: md.gid(),
    }
}

pub(crate) fn set_mode(path: &std::path::Path, perm: Permissions) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(perm.mode()))
}
