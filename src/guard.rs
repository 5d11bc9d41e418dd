//! Refuse symlink roots before anything is touched.

use std::path::Path;

use tracing::warn;

use crate::traits::FsRead;
use crate::{ChangeError, Metadata};

/// Check that `root` is not itself a symbolic link.
///
/// Runs once per operation, before the walk, whatever the recursion setting.
/// Returns the root's metadata so callers need not stat it again.
///
/// # Errors
///
/// - [`ChangeError::SymlinkRoot`] if `root` is a symlink
/// - [`ChangeError::Io`] if `root` cannot be classified (e.g. it does not exist)
pub fn ensure_not_symlink<F>(fs: &F, root: &Path) -> Result<Metadata, ChangeError>
where
    F: FsRead + ?Sized,
{
    let md = fs.symlink_metadata(root)?;
    if md.is_symlink() {
        warn!(path = %root.display(), "refusing to change permissions on a symlink");
        return Err(ChangeError::SymlinkRoot {
            path: root.to_path_buf(),
        });
    }
    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileType, FsError};

    struct One(FileType);

    impl FsRead for One {
        fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
            if path == Path::new("/missing") {
                return Err(FsError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(Metadata {
                file_type: self.0,
                ..Default::default()
            })
        }
    }

    #[test]
    fn symlink_root_is_refused() {
        let err = ensure_not_symlink(&One(FileType::Symlink), Path::new("/link")).unwrap_err();
        assert!(matches!(err, ChangeError::SymlinkRoot { ref path } if path == Path::new("/link")));
    }

    #[test]
    fn files_and_directories_pass() {
        let md = ensure_not_symlink(&One(FileType::File), Path::new("/f")).unwrap();
        assert!(md.is_file());
        let md = ensure_not_symlink(&One(FileType::Directory), Path::new("/d")).unwrap();
        assert!(md.is_dir());
    }

    #[test]
    fn missing_root_is_io_error() {
        let err = ensure_not_symlink(&One(FileType::File), Path::new("/missing")).unwrap_err();
        assert!(matches!(err, ChangeError::Io(FsError::NotFound { .. })));
        assert_eq!(err.status(), 404);
    }
}
