//! Service configuration.

use std::path::PathBuf;

use crate::backends::{NativeFs, RootedFs};
use crate::{FsChange, FsError};

/// Default number of names kept per identity namespace.
pub const DEFAULT_IDENTITY_CACHE_CAPACITY: usize = 256;

/// Which backing store to open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BackendConfig {
    /// Host paths, no translation.
    #[default]
    Direct,
    /// Virtual paths confined below `base`.
    Rooted {
        /// Directory that virtual `/` maps to.
        base: PathBuf,
    },
}

impl BackendConfig {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// For [`BackendConfig::Rooted`], see [`RootedFs::new`].
    pub fn build(&self) -> Result<Box<dyn FsChange>, FsError> {
        match self {
            BackendConfig::Direct => Ok(Box::new(NativeFs::new())),
            BackendConfig::Rooted { base } => Ok(Box::new(RootedFs::new(base)?)),
        }
    }
}

/// Settings for a [`PermissionService`](crate::PermissionService).
///
/// With the `serde` feature, loads from any serde format; missing fields
/// take their defaults:
///
/// ```rust
/// # #[cfg(feature = "serde")]
/// # {
/// use anyfs_permissions::{BackendConfig, ServiceConfig};
///
/// let config: ServiceConfig = serde_json::from_str(
///     r#"{ "backend": { "kind": "rooted", "base": "/srv/files" } }"#,
/// ).unwrap();
/// assert_eq!(config.identity_cache_capacity, 256);
/// assert!(matches!(config.backend, BackendConfig::Rooted { .. }));
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ServiceConfig {
    /// Backing store.
    pub backend: BackendConfig,
    /// Names cached per identity namespace; `0` disables the cache.
    pub identity_cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Direct,
            identity_cache_capacity: DEFAULT_IDENTITY_CACHE_CAPACITY,
        }
    }
}
