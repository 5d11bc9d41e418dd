//! # anyfs-permissions
//!
//! Mode, owner and group propagation over **pluggable filesystem backends**.
//!
//! This crate applies one validated permission change to a path, or to a
//! whole subtree, on behalf of a trusted backend service. It never follows
//! symlinks, stops at the first failure, and reports exactly what kind of
//! failure happened.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anyfs_permissions::{apply_permissions, ChangeRequest, NativeFs, SystemIdentities};
//! use std::path::Path;
//!
//! let spec = ChangeRequest::new()
//!     .mode("750")
//!     .group("www-data")
//!     .recursive(true)
//!     .into_spec(&SystemIdentities::new())?;
//!
//! let summary = apply_permissions(&NativeFs::new(), Path::new("/srv/site"), &spec)?;
//! println!("{} entries changed", summary.mutated);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ---
//!
//! ## Pipeline
//!
//! ```text
//! ChangeRequest ──▶ into_spec (IdentityResolver) ──▶ ChangeSpec
//!                                                        │
//!                  ensure_not_symlink(root) ◀────────────┘
//!                            │
//!                            ▼
//!                  PropagationEngine: pre-order walk, first error aborts
//! ```
//!
//! | Stage | Type | Fails with |
//! |-------|------|------------|
//! | Options builder | [`ChangeRequest::into_spec`] | [`ValidationError`] |
//! | Identity resolver | [`IdentityResolver`] | [`IdentityError`] (wrapped in `ValidationError`) |
//! | Symlink guard | [`ensure_not_symlink`] | [`ChangeError::SymlinkRoot`] |
//! | Propagation engine | [`PropagationEngine`] | [`ChangeError::Io`] |
//!
//! ---
//!
//! ## Backends
//!
//! The engine only sees [`FsChange`], the composite of five small traits
//! ([`FsRead`], [`FsDir`], [`FsPermissions`], [`FsOwnership`], [`FsPath`]).
//! Two backends ship with the crate:
//!
//! - [`NativeFs`]: host paths, used as-is
//! - [`RootedFs`]: virtual paths confined below a base directory
//!
//! ---
//!
//! ## Failure Semantics
//!
//! - Validation and symlink-root errors happen before any change.
//! - The walk stops at the first failing `chmod`/`chown`. Entries already
//!   changed **stay changed**; there is no rollback.
//! - Concurrent operations on overlapping trees are not coordinated.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | `Deserialize` for [`ChangeRequest`] and [`ServiceConfig`], plus `ChangeRequest::from_json` |

// Private modules
mod backends;
mod config;
mod engine;
mod error;
mod guard;
mod identity;
mod request;
mod service;
mod traits;
mod types;
mod walk;

// Public re-exports - error types
pub use error::{ChangeError, ErrorCategory, FsError, IdentityError, IdentityKind, ValidationError};

// Public re-exports - core types
pub use types::{DirEntry, FileType, Metadata, Permissions, WalkEntry};

// Public re-exports - backend traits
pub use traits::{FsChange, FsDir, FsOwnership, FsPath, FsPermissions, FsRead, ReadDirIter};

// Public re-exports - backends
pub use backends::{NativeFs, RootedFs};

// Public re-exports - identity resolution
pub use identity::{
    CachedIdentities, IdentityChange, IdentityResolver, IdentityTable, SystemIdentities,
};

// Public re-exports - requests and specs
pub use request::{ChangeRequest, ChangeSpec, parse_mode};

// Public re-exports - walking and propagation
pub use engine::{ApplySummary, EntryAction, PropagationEngine, apply_permissions, decide};
pub use guard::ensure_not_symlink;
pub use walk::{WalkControl, walk};

// Public re-exports - request handling
pub use config::{BackendConfig, DEFAULT_IDENTITY_CACHE_CAPACITY, ServiceConfig};
pub use service::{
    AllowAll, Authorizer, Caller, Hook, HookEvent, NoopHook, PermissionService, Response,
    STATUS_NO_CONTENT, TracingHook,
};
