//! Core types shared by backends, the walker and the engine.

use std::path::PathBuf;

/// Type of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file (or anything that is neither a directory nor a symlink).
    File,
    /// Directory.
    Directory,
    /// Symbolic link. Never followed.
    Symlink,
}

/// Metadata for a filesystem entry, read without following symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Type of the entry (file, directory, symlink).
    pub file_type: FileType,
    /// Permission bits.
    pub permissions: Permissions,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns `true` if this is a symbolic link.
    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            file_type: FileType::File,
            permissions: Permissions::default_file(),
            uid: 0,
            gid: 0,
        }
    }
}

/// A directory entry returned from `read_dir`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (filename only, not full path).
    pub name: String,
    /// Full virtual path to the entry.
    pub path: PathBuf,
    /// Type of the entry.
    pub file_type: FileType,
}

/// Unix-style permissions stored as a mode bitmask.
///
/// Holds the permission bits plus setuid/setgid/sticky (`0o7777`). Requested
/// modes are narrower: see [`Permissions::from_request_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Keep only the nine rwx bits for owner, group and other.
    #[inline]
    pub const fn from_request_bits(bits: u32) -> Self {
        Self(bits & 0o777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Default permissions for a new file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

impl std::fmt::Display for Permissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03o}", self.0)
    }
}

/// One entry produced by [`walk`](crate::walk).
///
/// Lives only for the duration of a single visit.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Virtual path of the entry.
    pub path: PathBuf,
    /// Classification, taken without following symlinks.
    pub file_type: FileType,
    /// Current permission bits.
    pub permissions: Permissions,
    /// Distance from the walk root (the root itself is 0).
    pub depth: usize,
}

impl WalkEntry {
    /// Returns `true` for the entry the walk started at.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_classification() {
        let m = Metadata {
            file_type: FileType::Symlink,
            ..Default::default()
        };
        assert!(!m.is_file());
        assert!(!m.is_dir());
        assert!(m.is_symlink());

        let m = Metadata {
            file_type: FileType::Directory,
            ..Default::default()
        };
        assert!(m.is_dir());
    }

    #[test]
    fn permissions_from_mode_masks_file_type_bits() {
        let p = Permissions::from_mode(0o100755);
        assert_eq!(p.mode(), 0o755);
        assert_eq!(Permissions::from_mode(0o4755).mode(), 0o4755);
    }

    #[test]
    fn permissions_from_request_bits_keeps_nine_bits() {
        assert_eq!(Permissions::from_request_bits(0o4755).mode(), 0o755);
        assert_eq!(Permissions::from_request_bits(0o1777).mode(), 0o777);
    }

    #[test]
    fn permissions_display_is_octal() {
        assert_eq!(Permissions::from_mode(0o7).to_string(), "007");
        assert_eq!(Permissions::from_mode(0o755).to_string(), "755");
    }

    #[test]
    fn walk_entry_root() {
        let entry = WalkEntry {
            path: PathBuf::from("/"),
            file_type: FileType::Directory,
            permissions: Permissions::default_dir(),
            depth: 0,
        };
        assert!(entry.is_root());
    }

    #[test]
    fn types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileType>();
        assert_send_sync::<Metadata>();
        assert_send_sync::<DirEntry>();
        assert_send_sync::<Permissions>();
        assert_send_sync::<WalkEntry>();
    }
}
