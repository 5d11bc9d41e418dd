//! Error types for permission propagation.
//!
//! Three layers of errors exist:
//!
//! | Type | Raised by | Mutates anything? |
//! |------|-----------|-------------------|
//! | [`ValidationError`] | Options builder, mode parser | never |
//! | [`IdentityError`] | Identity resolvers | never |
//! | [`FsError`] | Backends | maybe (a prefix of the walk) |
//!
//! [`ChangeError`] is the operation-level taxonomy returned to callers. It
//! carries a [`ErrorCategory`] and an HTTP-style status code.

use std::path::PathBuf;

/// Filesystem backend error with contextual variants.
///
/// # Examples
///
/// ```rust
/// use anyfs_permissions::FsError;
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("/missing") };
/// assert_eq!(err.to_string(), "not found: /missing");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The path that is not a directory.
        path: PathBuf,
    },

    /// Permission denied for operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path where permission was denied.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    /// A virtual path tried to leave the root of a rooted backend.
    #[error("path escapes backend root: {path}")]
    PathEscape {
        /// The offending virtual path.
        path: PathBuf,
    },

    /// Operation is not supported by this backend.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Generic backend error.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Attach operation and path context to an I/O error.
    ///
    /// Well-known kinds map onto the dedicated variants so callers can match
    /// on them without digging into the source error.
    pub fn from_io(operation: &'static str, path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path, operation },
            std::io::ErrorKind::NotADirectory => FsError::NotADirectory { path },
            _ => FsError::Io {
                operation,
                path,
                source: error,
            },
        }
    }

    /// HTTP-style status describing the nature of the failure.
    pub fn status(&self) -> u16 {
        match self {
            FsError::NotFound { .. } => 404,
            FsError::PermissionDenied { .. } => 403,
            FsError::PathEscape { .. } => 403,
            FsError::NotADirectory { .. } => 400,
            FsError::NotSupported { .. } => 501,
            FsError::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::AlreadyExists => 409,
                _ => 500,
            },
            FsError::Backend(_) => 500,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        FsError::from_io("io", PathBuf::new(), error)
    }
}

/// Which identity namespace a lookup targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    /// User (owner) namespace.
    User,
    /// Group namespace.
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::User => f.write_str("user"),
            IdentityKind::Group => f.write_str("group"),
        }
    }
}

/// Failure to map an owner or group token onto a numeric id.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The symbolic name does not exist in the identity database.
    #[error("unknown {kind}: {name}")]
    Unknown {
        /// Namespace that was searched.
        kind: IdentityKind,
        /// The name that was looked up.
        name: String,
    },

    /// A numeric token that cannot be a valid id.
    #[error("{kind} id out of range: {token}")]
    OutOfRange {
        /// Namespace of the token.
        kind: IdentityKind,
        /// The raw token.
        token: String,
    },

    /// The identity database itself failed.
    #[error("{kind} lookup failed for {name}: {reason}")]
    Lookup {
        /// Namespace that was searched.
        kind: IdentityKind,
        /// The name that was looked up.
        name: String,
        /// Description of the failure.
        reason: String,
    },
}

/// A change request that cannot be turned into a [`ChangeSpec`](crate::ChangeSpec).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Mode is not an octal number.
    #[error("invalid mode {value:?} (expect octal, e.g. 755)")]
    InvalidMode {
        /// The rejected mode string.
        value: String,
    },

    /// Owner token could not be resolved.
    #[error("invalid owner {token:?}: {source}")]
    InvalidOwner {
        /// The rejected owner token.
        token: String,
        /// Why resolution failed.
        #[source]
        source: IdentityError,
    },

    /// Group token could not be resolved.
    #[error("invalid group {token:?}: {source}")]
    InvalidGroup {
        /// The rejected group token.
        token: String,
        /// Why resolution failed.
        #[source]
        source: IdentityError,
    },

    /// Mode, owner and group were all absent.
    #[error("no permission changes requested")]
    NoChangesRequested,
}

/// Coarse classification of a [`ChangeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed request; nothing was touched.
    Validation,
    /// Refused for safety (symlink root); nothing was touched.
    Security,
    /// Caller is not allowed to modify the target.
    Authorization,
    /// A backend operation failed; a prefix of the walk may be mutated.
    Io,
}

/// Error returned by a permission change operation.
///
/// # Examples
///
/// ```rust
/// use anyfs_permissions::{ChangeError, ErrorCategory, ValidationError};
///
/// let err = ChangeError::from(ValidationError::NoChangesRequested);
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!(err.status(), 400);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    /// The request was malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The root target is a symbolic link.
    #[error("refusing to change permissions on a symlink: {path}")]
    SymlinkRoot {
        /// The symlink path.
        path: PathBuf,
    },

    /// The caller may not modify the target.
    #[error("not authorized to modify {path}")]
    Unauthorized {
        /// The target path.
        path: PathBuf,
    },

    /// A backend operation failed.
    #[error(transparent)]
    Io(#[from] FsError),
}

impl ChangeError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChangeError::Validation(_) => ErrorCategory::Validation,
            ChangeError::SymlinkRoot { .. } => ErrorCategory::Security,
            ChangeError::Unauthorized { .. } => ErrorCategory::Authorization,
            ChangeError::Io(_) => ErrorCategory::Io,
        }
    }

    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ChangeError::Validation(_) | ChangeError::SymlinkRoot { .. } => 400,
            ChangeError::Unauthorized { .. } => 403,
            ChangeError::Io(err) => err.status(),
        }
    }
}
