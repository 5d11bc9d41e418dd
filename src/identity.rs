//! # Identity Resolution
//!
//! Maps owner and group tokens onto numeric ids.
//!
//! ## Token Rules
//!
//! | Token | Result |
//! |-------|--------|
//! | blank (`""`, `"  "`) | `Ok(None)`, attribute not requested |
//! | `"-1"` or `"4294967295"` | `Ok(Some(IdentityChange::Keep))`, requested but left unchanged |
//! | numeric (`"1000"`) | `Ok(Some(IdentityChange::Set(1000)))`, **not** checked against the database |
//! | other negative or too large (`"-20"`) | [`IdentityError::OutOfRange`] |
//! | symbolic (`"www-data"`) | looked up; absent names fail with [`IdentityError::Unknown`] |
//!
//! Numeric ids are taken on trust while names must exist. The asymmetry is
//! long-standing behaviour that callers rely on to assign ids with no
//! passwd entry (container uids, for instance).
//!
//! ## Implementations
//!
//! - [`SystemIdentities`]: the host's user and group databases
//! - [`IdentityTable`]: fixed in-memory tables
//! - [`CachedIdentities`]: bounded cache around any resolver

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{IdentityError, IdentityKind};

/// A resolved owner or group.
///
/// `Keep` is the `-1` sentinel of `chown(2)`: the attribute counts as
/// requested but is passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityChange {
    /// Leave the attribute as it is.
    Keep,
    /// Set the attribute to this id.
    Set(u32),
}

impl IdentityChange {
    /// Wrap a raw id; `u32::MAX` is the unchanged sentinel.
    pub fn from_id(id: u32) -> Self {
        if id == u32::MAX {
            IdentityChange::Keep
        } else {
            IdentityChange::Set(id)
        }
    }

    /// The id to pass to `chown`, `None` for unchanged.
    pub fn id(self) -> Option<u32> {
        match self {
            IdentityChange::Keep => None,
            IdentityChange::Set(id) => Some(id),
        }
    }
}

/// Resolve owner and group tokens to numeric ids.
///
/// Implementors only provide the symbolic lookups. Blank and numeric tokens
/// are handled by the provided [`resolve_user`](Self::resolve_user) and
/// [`resolve_group`](Self::resolve_group) methods and never reach them.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use anyfs_permissions::{IdentityChange, IdentityResolver, IdentityTable};
///
/// let ids = IdentityTable::new().with_user("alice", 1001);
/// assert_eq!(ids.resolve_user("alice").unwrap(), Some(IdentityChange::Set(1001)));
/// assert_eq!(ids.resolve_user("42").unwrap(), Some(IdentityChange::Set(42)));
/// assert_eq!(ids.resolve_user("-1").unwrap(), Some(IdentityChange::Keep));
/// assert_eq!(ids.resolve_user(" ").unwrap(), None);
/// assert!(ids.resolve_user("bob").is_err());
/// ```
pub trait IdentityResolver: Send + Sync {
    /// Look up a user name. `name` is trimmed, non-empty and non-numeric.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unknown`] if no such user exists
    /// - [`IdentityError::Lookup`] if the database could not be queried
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError>;

    /// Look up a group name. `name` is trimmed, non-empty and non-numeric.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::Unknown`] if no such group exists
    /// - [`IdentityError::Lookup`] if the database could not be queried
    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError>;

    /// Resolve an owner token. `Ok(None)` means the token was blank.
    fn resolve_user(&self, token: &str) -> Result<Option<IdentityChange>, IdentityError> {
        resolve_token(IdentityKind::User, token, |name| self.lookup_user(name))
    }

    /// Resolve a group token. `Ok(None)` means the token was blank.
    fn resolve_group(&self, token: &str) -> Result<Option<IdentityChange>, IdentityError> {
        resolve_token(IdentityKind::Group, token, |name| self.lookup_group(name))
    }
}

fn resolve_token(
    kind: IdentityKind,
    token: &str,
    lookup: impl FnOnce(&str) -> Result<u32, IdentityError>,
) -> Result<Option<IdentityChange>, IdentityError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    if is_numeric(token) {
        let out_of_range = || IdentityError::OutOfRange {
            kind,
            token: token.to_string(),
        };
        return match token.parse::<i64>() {
            Ok(-1) => Ok(Some(IdentityChange::Keep)),
            Ok(id) => u32::try_from(id)
                .map(|id| Some(IdentityChange::from_id(id)))
                .map_err(|_| out_of_range()),
            Err(_) => Err(out_of_range()),
        };
    }

    lookup(token).map(|id| Some(IdentityChange::from_id(id)))
}

fn is_numeric(token: &str) -> bool {
    let digits = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for Box<T> {
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError> {
        (**self).lookup_user(name)
    }

    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError> {
        (**self).lookup_group(name)
    }
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for std::sync::Arc<T> {
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError> {
        (**self).lookup_user(name)
    }

    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError> {
        (**self).lookup_group(name)
    }
}

// ============================================================================
// System database
// ============================================================================

/// Resolver backed by the host's passwd and group databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentities;

impl SystemIdentities {
    /// Create a system resolver.
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for SystemIdentities {
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError> {
        match nix::unistd::User::from_name(name) {
            Ok(Some(user)) => Ok(user.uid.as_raw()),
            Ok(None) => Err(IdentityError::Unknown {
                kind: IdentityKind::User,
                name: name.to_string(),
            }),
            Err(errno) => Err(IdentityError::Lookup {
                kind: IdentityKind::User,
                name: name.to_string(),
                reason: errno.desc().to_string(),
            }),
        }
    }

    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError> {
        match nix::unistd::Group::from_name(name) {
            Ok(Some(group)) => Ok(group.gid.as_raw()),
            Ok(None) => Err(IdentityError::Unknown {
                kind: IdentityKind::Group,
                name: name.to_string(),
            }),
            Err(errno) => Err(IdentityError::Lookup {
                kind: IdentityKind::Group,
                name: name.to_string(),
                reason: errno.desc().to_string(),
            }),
        }
    }
}

// ============================================================================
// Fixed tables
// ============================================================================

/// Resolver over fixed name tables.
///
/// Useful for sandboxed deployments whose ids do not match the host, and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    users: HashMap<String, u32>,
    groups: HashMap<String, u32>,
}

impl IdentityTable {
    /// Create empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user name.
    pub fn with_user(mut self, name: impl Into<String>, uid: u32) -> Self {
        self.users.insert(name.into(), uid);
        self
    }

    /// Add a group name.
    pub fn with_group(mut self, name: impl Into<String>, gid: u32) -> Self {
        self.groups.insert(name.into(), gid);
        self
    }
}

impl IdentityResolver for IdentityTable {
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| IdentityError::Unknown {
                kind: IdentityKind::User,
                name: name.to_string(),
            })
    }

    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError> {
        self.groups
            .get(name)
            .copied()
            .ok_or_else(|| IdentityError::Unknown {
                kind: IdentityKind::Group,
                name: name.to_string(),
            })
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Bounded FIFO cache for one namespace.
#[derive(Debug)]
struct NameCache {
    entries: HashMap<String, u32>,
    order: VecDeque<String>,
    capacity: usize,
}

impl NameCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.entries.get(name).copied()
    }

    fn insert(&mut self, name: &str, id: u32) {
        if self.capacity == 0 || self.entries.contains_key(name) {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.entries.insert(name.to_string(), id);
        self.order.push_back(name.to_string());
    }

    fn remove(&mut self, name: &str) {
        if self.entries.remove(name).is_some() {
            self.order.retain(|n| n != name);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[derive(Debug)]
struct Caches {
    users: NameCache,
    groups: NameCache,
}

/// Bounded cache around another resolver.
///
/// Only successful symbolic lookups are stored; failures always go back to
/// the inner resolver. When a namespace is full the oldest entry is evicted.
/// Entries never expire on their own: call [`invalidate`](Self::invalidate)
/// or [`clear`](Self::clear) after the identity database changes.
///
/// # Example
///
/// ```rust
/// use anyfs_permissions::{CachedIdentities, IdentityChange, IdentityResolver, IdentityTable};
///
/// let ids = CachedIdentities::new(IdentityTable::new().with_group("staff", 50), 16);
/// assert_eq!(ids.resolve_group("staff").unwrap(), Some(IdentityChange::Set(50)));
/// assert_eq!(ids.cached_len(), 1);
/// ids.clear();
/// assert_eq!(ids.cached_len(), 0);
/// ```
#[derive(Debug)]
pub struct CachedIdentities<R> {
    inner: R,
    caches: Mutex<Caches>,
}

impl<R: IdentityResolver> CachedIdentities<R> {
    /// Wrap `inner`, keeping at most `capacity` names per namespace.
    ///
    /// A capacity of zero disables caching.
    pub fn new(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            caches: Mutex::new(Caches {
                users: NameCache::new(capacity),
                groups: NameCache::new(capacity),
            }),
        }
    }

    /// The wrapped resolver.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Forget a cached user or group name.
    pub fn invalidate(&self, token: &str) {
        let token = token.trim();
        let mut caches = self.lock();
        caches.users.remove(token);
        caches.groups.remove(token);
    }

    /// Forget everything.
    pub fn clear(&self) {
        let mut caches = self.lock();
        caches.users.clear();
        caches.groups.clear();
    }

    /// Number of cached names across both namespaces.
    pub fn cached_len(&self) -> usize {
        let caches = self.lock();
        caches.users.entries.len() + caches.groups.entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Caches> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cached(
        &self,
        kind: IdentityKind,
        name: &str,
        lookup: impl FnOnce(&str) -> Result<u32, IdentityError>,
    ) -> Result<u32, IdentityError> {
        let hit = {
            let caches = self.lock();
            match kind {
                IdentityKind::User => caches.users.get(name),
                IdentityKind::Group => caches.groups.get(name),
            }
        };
        if let Some(id) = hit {
            debug!(%kind, name, id, "identity cache hit");
            return Ok(id);
        }

        debug!(%kind, name, "identity cache miss");
        let id = lookup(name)?;
        let mut caches = self.lock();
        match kind {
            IdentityKind::User => caches.users.insert(name, id),
            IdentityKind::Group => caches.groups.insert(name, id),
        }
        Ok(id)
    }
}

impl<R: IdentityResolver> IdentityResolver for CachedIdentities<R> {
    fn lookup_user(&self, name: &str) -> Result<u32, IdentityError> {
        self.cached(IdentityKind::User, name, |n| self.inner.lookup_user(n))
    }

    fn lookup_group(&self, name: &str) -> Result<u32, IdentityError> {
        self.cached(IdentityKind::Group, name, |n| self.inner.lookup_group(n))
    }
}
