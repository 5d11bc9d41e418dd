//! # Request Handling
//!
//! Wires authorization, validation, the audit hook and the engine together
//! for one request:
//!
//! ```text
//! authorize ─▶ ChangeRequest::into_spec ─▶ hook( symlink guard ─▶ walk )
//! ```
//!
//! Transport is left to the caller; [`PermissionService::respond`] gives an
//! HTTP-style status and message to put on the wire.

use std::path::Path;

use tracing::info;

use crate::config::ServiceConfig;
use crate::engine::{ApplySummary, PropagationEngine};
use crate::identity::{CachedIdentities, IdentityResolver, SystemIdentities};
use crate::request::ChangeRequest;
use crate::{ChangeError, FsChange, FsError};

/// Status reported for a successful change (no content).
pub const STATUS_NO_CONTENT: u16 = 204;

/// The authenticated user on whose behalf a change runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Login name, for audit records.
    pub username: String,
    /// Whether the account has modify rights at all.
    pub can_modify: bool,
}

impl Caller {
    /// A caller with modify rights.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            can_modify: true,
        }
    }

    /// A caller without modify rights.
    pub fn read_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            can_modify: false,
        }
    }
}

/// Per-path access rules, checked after the caller's modify flag.
pub trait Authorizer: Send + Sync {
    /// Whether `caller` may change `path`.
    fn allows(&self, caller: &Caller, path: &Path) -> bool;
}

/// Authorizer with no path rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn allows(&self, _caller: &Caller, _path: &Path) -> bool {
        true
    }
}

impl<T> Authorizer for T
where
    T: Fn(&Caller, &Path) -> bool + Send + Sync,
{
    fn allows(&self, caller: &Caller, path: &Path) -> bool {
        self(caller, path)
    }
}

/// Context handed to a [`Hook`].
#[derive(Debug, Clone, Copy)]
pub struct HookEvent<'a> {
    /// Action name, `"chmod"` for permission changes.
    pub action: &'static str,
    /// Target path as the caller sent it.
    pub path: &'a Path,
    /// Who asked.
    pub caller: &'a Caller,
}

/// Wrapper run around every authorized, validated operation.
///
/// A hook must call `action` exactly once to perform the change, and may do
/// work before and after it. Returning an error without calling `action`
/// cancels the change.
pub trait Hook: Send + Sync {
    /// Run `action` for `event`.
    fn run(
        &self,
        event: &HookEvent<'_>,
        action: &mut dyn FnMut() -> Result<(), ChangeError>,
    ) -> Result<(), ChangeError>;
}

/// Hook that just runs the action.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl Hook for NoopHook {
    fn run(
        &self,
        _event: &HookEvent<'_>,
        action: &mut dyn FnMut() -> Result<(), ChangeError>,
    ) -> Result<(), ChangeError> {
        action()
    }
}

/// Hook that writes an audit record before and after the action.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl Hook for TracingHook {
    fn run(
        &self,
        event: &HookEvent<'_>,
        action: &mut dyn FnMut() -> Result<(), ChangeError>,
    ) -> Result<(), ChangeError> {
        info!(
            action = event.action,
            path = %event.path.display(),
            user = %event.caller.username,
            "before"
        );
        let result = action();
        match &result {
            Ok(()) => info!(
                action = event.action,
                path = %event.path.display(),
                user = %event.caller.username,
                "after"
            ),
            Err(err) => info!(
                action = event.action,
                path = %event.path.display(),
                user = %event.caller.username,
                error = %err,
                "after (failed)"
            ),
        }
        result
    }
}

/// Outcome of a request, ready for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP-style status code.
    pub status: u16,
    /// Error message; `None` on success.
    pub message: Option<String>,
}

impl Response {
    /// Build the response for a finished request.
    pub fn from_result<T>(result: &Result<T, ChangeError>) -> Self {
        match result {
            Ok(_) => Self {
                status: STATUS_NO_CONTENT,
                message: None,
            },
            Err(err) => Self {
                status: err.status(),
                message: Some(err.to_string()),
            },
        }
    }
}

/// Handles permission change requests against one backend.
///
/// # Example
///
/// ```rust,no_run
/// use anyfs_permissions::{Caller, ChangeRequest, IdentityTable, NativeFs, PermissionService};
/// use std::path::Path;
///
/// let service = PermissionService::new(NativeFs::new(), IdentityTable::new());
/// let response = service.respond(
///     &Caller::new("admin"),
///     Path::new("/srv/files/reports"),
///     &ChangeRequest::new().mode("750").recursive(true),
/// );
/// assert_eq!(response.status, 204);
/// ```
pub struct PermissionService<F, R> {
    fs: F,
    identities: R,
    authorizer: Box<dyn Authorizer>,
    hook: Box<dyn Hook>,
}

impl<F, R> std::fmt::Debug for PermissionService<F, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionService").finish_non_exhaustive()
    }
}

impl PermissionService<Box<dyn FsChange>, CachedIdentities<SystemIdentities>> {
    /// Open the configured backend with a cached system identity resolver.
    ///
    /// # Errors
    ///
    /// See [`BackendConfig::build`](crate::BackendConfig::build).
    pub fn from_config(config: &ServiceConfig) -> Result<Self, FsError> {
        let fs = config.backend.build()?;
        let identities =
            CachedIdentities::new(SystemIdentities::new(), config.identity_cache_capacity);
        Ok(Self::new(fs, identities))
    }
}

impl<F: FsChange, R: IdentityResolver> PermissionService<F, R> {
    /// Create a service with no path rules and no hook.
    pub fn new(fs: F, identities: R) -> Self {
        Self {
            fs,
            identities,
            authorizer: Box::new(AllowAll),
            hook: Box::new(NoopHook),
        }
    }

    /// Replace the path authorizer.
    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Box::new(authorizer);
        self
    }

    /// Replace the hook.
    pub fn with_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// The backend.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// The identity resolver.
    pub fn identities(&self) -> &R {
        &self.identities
    }

    /// Apply `request` to `path` for `caller`.
    ///
    /// # Errors
    ///
    /// - [`ChangeError::Unauthorized`] if the caller may not modify `path`
    /// - [`ChangeError::Validation`] for a malformed request
    /// - [`ChangeError::SymlinkRoot`] if `path` is a symlink
    /// - [`ChangeError::Io`] if the walk aborted
    ///
    /// Only the last leaves anything changed.
    pub fn handle(
        &self,
        caller: &Caller,
        path: &Path,
        request: &ChangeRequest,
    ) -> Result<ApplySummary, ChangeError> {
        if !caller.can_modify || !self.authorizer.allows(caller, path) {
            return Err(ChangeError::Unauthorized {
                path: path.to_path_buf(),
            });
        }

        let spec = request.into_spec(&self.identities)?;

        let engine = PropagationEngine::new(&self.fs);
        let mut summary = None;
        let event = HookEvent {
            action: "chmod",
            path,
            caller,
        };
        self.hook.run(&event, &mut || -> Result<(), ChangeError> {
            summary = Some(engine.apply(path, &spec)?);
            Ok(())
        })?;

        Ok(summary.unwrap_or_default())
    }

    /// [`handle`](Self::handle), reduced to a status and message.
    pub fn respond(&self, caller: &Caller, path: &Path, request: &ChangeRequest) -> Response {
        Response::from_result(&self.handle(caller, path, request))
    }
}
