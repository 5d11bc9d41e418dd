//! A backend confined to one base directory.

use std::path::{Component, Path, PathBuf};

use tracing::trace;

use super::{file_type_from_std, metadata_from_std, set_mode};
use crate::traits::normalize_virtual;
use crate::{
    DirEntry, FsDir, FsError, FsOwnership, FsPath, FsPermissions, FsRead, Metadata, Permissions,
    ReadDirIter,
};

/// Backend that maps virtual paths below a base directory.
///
/// `/` in virtual space is `base` on disk. `.` and `..` are resolved
/// lexically before joining; climbing above `/` fails with
/// [`FsError::PathEscape`]. Errors report virtual paths so the base
/// directory is never exposed to callers.
///
/// Symlinks are never followed. A path that would pass through a symlink
/// fails with [`FsError::PathEscape`]. [`read_dir`](FsDir::read_dir) and
/// [`set_permissions`](FsPermissions::set_permissions) also refuse a
/// symlink as the final component, since both would dereference it.
/// Checks run before each call, so a tree swapped underneath a running
/// operation is not detected.
#[derive(Debug, Clone)]
pub struct RootedFs {
    base: PathBuf,
}

impl RootedFs {
    /// Confine a backend to `base`, which must be an existing directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `base` does not exist
    /// - [`FsError::NotADirectory`] if `base` is not a directory
    pub fn new(base: impl AsRef<Path>) -> Result<Self, FsError> {
        let base = base.as_ref();
        let base = std::fs::canonicalize(base).map_err(|e| FsError::from_io("open", base, e))?;
        if !base.is_dir() {
            return Err(FsError::NotADirectory { path: base });
        }
        Ok(Self { base })
    }

    /// The canonical base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Map a virtual path onto disk, refusing symlinked ancestors.
    fn resolve(&self, path: &Path) -> Result<PathBuf, FsError> {
        self.resolve_checked(path, false)
    }

    /// Like [`resolve`](Self::resolve), but the final component must not be
    /// a symlink either.
    fn resolve_no_follow(&self, path: &Path) -> Result<PathBuf, FsError> {
        self.resolve_checked(path, true)
    }

    fn resolve_checked(&self, path: &Path, check_last: bool) -> Result<PathBuf, FsError> {
        let virtual_path = normalize_virtual(path)?;
        let relative = virtual_path
            .strip_prefix("/")
            .map_err(|_| FsError::PathEscape {
                path: path.to_path_buf(),
            })?;
        self.confine(relative, path, check_last)
    }

    /// Join `relative` onto the base one component at a time, failing on
    /// any symlink met on the way. `shown` is the path used in errors.
    fn confine(&self, relative: &Path, shown: &Path, check_last: bool) -> Result<PathBuf, FsError> {
        let escape = || FsError::PathEscape {
            path: shown.to_path_buf(),
        };

        let mut real = self.base.clone();
        let mut components = relative.components().peekable();
        let mut exists = true;
        while let Some(component) = components.next() {
            let Component::Normal(name) = component else {
                return Err(escape());
            };
            real.push(name);

            let is_last = components.peek().is_none();
            if !exists || (is_last && !check_last) {
                continue;
            }
            match std::fs::symlink_metadata(&real) {
                Ok(md) if md.file_type().is_symlink() => {
                    trace!(path = %shown.display(), "symlink on path refused");
                    return Err(escape());
                }
                Ok(_) => {}
                // The caller's own operation reports the missing entry.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => exists = false,
                Err(e) => return Err(FsError::from_io("resolve", shown, e)),
            }
        }
        Ok(real)
    }
}

impl FsRead for RootedFs {
    fn symlink_metadata(&self, path: &Path) -> Result<Metadata, FsError> {
        let real = self.resolve(path)?;
        let md = std::fs::symlink_metadata(&real)
            .map_err(|e| FsError::from_io("symlink_metadata", path, e))?;
        Ok(metadata_from_std(&md))
    }
}

impl FsDir for RootedFs {
    fn read_dir(&self, path: &Path) -> Result<ReadDirIter, FsError> {
        let real = self.resolve_no_follow(path)?;
        let virtual_dir = normalize_virtual(path)?;
        let iter = std::fs::read_dir(&real).map_err(|e| FsError::from_io("read_dir", path, e))?;

        Ok(ReadDirIter::new(iter.map(move |entry| {
            let entry = entry.map_err(|e| FsError::from_io("read_dir", virtual_dir.clone(), e))?;
            let entry_path = virtual_dir.join(entry.file_name());
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

impl FsPermissions for RootedFs {
    fn set_permissions(&self, path: &Path, perm: Permissions) -> Result<(), FsError> {
        let real = self.resolve_no_follow(path)?;
        trace!(path = %path.display(), mode = %perm, "chmod");
        set_mode(&real, perm).map_err(|e| FsError::from_io("chmod", path, e))
    }
}

impl FsOwnership for RootedFs {
    fn set_owner(
        &self,
        real_path: &Path,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<(), FsError> {
        let relative = real_path
            .strip_prefix(&self.base)
            .map_err(|_| FsError::PathEscape {
                path: real_path.to_path_buf(),
            })?;
        let real = self.confine(relative, real_path, false)?;
        trace!(path = %real.display(), ?uid, ?gid, "chown");
        std::os::unix::fs::lchown(&real, uid, gid).map_err(|e| FsError::from_io("chown", real_path, e))
    }
}

impl FsPath for RootedFs {
    fn real_path(&self, path: &Path) -> Result<PathBuf, FsError> {
        self.resolve(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_path_joins_base() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = RootedFs::new(tmp.path()).unwrap();

        let real = fs.real_path(Path::new("/docs/./a/../b.txt")).unwrap();
        assert_eq!(real, fs.base().join("docs/b.txt"));
        assert_eq!(fs.real_path(Path::new("/")).unwrap(), fs.base());
    }

    #[test]
    fn escaping_paths_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = RootedFs::new(tmp.path()).unwrap();

        let err = fs.symlink_metadata(Path::new("/../etc")).unwrap_err();
        assert!(matches!(err, FsError::PathEscape { .. }));

        let err = fs
            .set_owner(Path::new("/etc/passwd"), Some(0), None)
            .unwrap_err();
        assert!(matches!(err, FsError::PathEscape { .. }));
    }

    /// `base/escape` points at a sibling directory outside the base.
    fn with_escape_link() -> (tempfile::TempDir, RootedFs, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("base");
        let outside = tmp.path().join("outside");
        std::fs::create_dir(&base).unwrap();
        std::fs::create_dir(&outside).unwrap();
        let secret = outside.join("secret.txt");
        std::fs::write(&secret, b"s").unwrap();
        std::fs::set_permissions(&secret, std::fs::Permissions::from_mode(0o600)).unwrap();
        std::os::unix::fs::symlink(&outside, base.join("escape")).unwrap();

        let fs = RootedFs::new(&base).unwrap();
        (tmp, fs, secret)
    }

    #[test]
    fn symlinked_ancestor_is_refused() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, fs, secret) = with_escape_link();
        let through = Path::new("/escape/secret.txt");

        assert!(matches!(
            fs.symlink_metadata(through),
            Err(FsError::PathEscape { .. })
        ));
        assert!(matches!(
            fs.set_permissions(through, Permissions::from_mode(0o777)),
            Err(FsError::PathEscape { .. })
        ));
        assert!(matches!(fs.real_path(through), Err(FsError::PathEscape { .. })));

        let real = fs.base().join("escape/secret.txt");
        assert!(matches!(
            fs.set_owner(&real, None, None),
            Err(FsError::PathEscape { .. })
        ));

        let mode = std::fs::metadata(&secret).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn final_symlink_is_classified_but_not_followed() {
        let (_tmp, fs, _secret) = with_escape_link();
        let link = Path::new("/escape");

        assert!(fs.symlink_metadata(link).unwrap().is_symlink());
        assert!(fs.real_path(link).is_ok());
        assert!(matches!(fs.read_dir(link), Err(FsError::PathEscape { .. })));
        assert!(matches!(
            fs.set_permissions(link, Permissions::from_mode(0o777)),
            Err(FsError::PathEscape { .. })
        ));
    }

    #[test]
    fn missing_ancestor_reports_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = RootedFs::new(tmp.path()).unwrap();
        assert!(matches!(
            fs.symlink_metadata(Path::new("/no/such/file")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn base_must_be_a_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain");
        std::fs::write(&file, b"x").unwrap();

        assert!(matches!(
            RootedFs::new(&file),
            Err(FsError::NotADirectory { .. })
        ));
        assert!(matches!(
            RootedFs::new(tmp.path().join("missing")),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn read_dir_reports_virtual_paths() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("docs")).unwrap();
        std::fs::write(tmp.path().join("docs/a.txt"), b"a").unwrap();

        let fs = RootedFs::new(tmp.path()).unwrap();
        let entries = fs.read_dir(Path::new("/docs")).unwrap().collect_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("/docs/a.txt"));
    }

    #[test]
    fn errors_use_virtual_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = RootedFs::new(tmp.path()).unwrap();

        let err = fs.symlink_metadata(Path::new("/nope")).unwrap_err();
        assert_eq!(err.to_string(), "not found: /nope");
    }
}
