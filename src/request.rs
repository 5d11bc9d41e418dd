//! Change requests and their validated form.
//!
//! A [`ChangeRequest`] is what a client sends. [`ChangeRequest::into_spec`]
//! validates it into an immutable [`ChangeSpec`], resolving owner and group
//! tokens on the way. Nothing here touches the filesystem.

use crate::error::ValidationError;
use crate::identity::{IdentityChange, IdentityResolver};
use crate::types::Permissions;

/// A raw permission change request.
///
/// Every field is optional. A present but blank string counts as absent, so
/// clients that always send all three fields keep working.
///
/// # Example
///
/// ```rust
/// use anyfs_permissions::{ChangeRequest, IdentityTable};
///
/// let spec = ChangeRequest::new()
///     .mode("750")
///     .group("staff")
///     .recursive(true)
///     .into_spec(&IdentityTable::new().with_group("staff", 50))
///     .unwrap();
///
/// assert_eq!(spec.mode().map(|m| m.mode()), Some(0o750));
/// assert_eq!(spec.owner(), None);
/// assert_eq!(spec.group(), Some(50));
/// assert!(spec.recursive());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChangeRequest {
    /// Octal mode, e.g. `"755"`.
    pub mode: Option<String>,
    /// User name or numeric uid.
    pub owner: Option<String>,
    /// Group name or numeric gid.
    pub group: Option<String>,
    /// Apply to descendants as well as the target.
    pub recursive: bool,
}

impl ChangeRequest {
    /// An empty request. Fails validation until a field is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested mode.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the requested owner.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the requested group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set whether the change applies to descendants.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Decode a request from its JSON body.
    ///
    /// Missing fields default to absent / `false`.
    #[cfg(feature = "serde")]
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Validate the request and resolve identities.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NoChangesRequested`] if mode, owner and group are all blank
    /// - [`ValidationError::InvalidMode`] if the mode is not octal
    /// - [`ValidationError::InvalidOwner`] / [`ValidationError::InvalidGroup`] if a
    ///   token cannot be resolved
    pub fn into_spec<R>(&self, resolver: &R) -> Result<ChangeSpec, ValidationError>
    where
        R: IdentityResolver + ?Sized,
    {
        let mode = present(&self.mode);
        let owner = present(&self.owner);
        let group = present(&self.group);

        if mode.is_none() && owner.is_none() && group.is_none() {
            return Err(ValidationError::NoChangesRequested);
        }

        let mode = mode.map(parse_mode).transpose()?;

        let uid = match owner {
            Some(token) => resolver
                .resolve_user(token)
                .map_err(|source| ValidationError::InvalidOwner {
                    token: token.to_string(),
                    source,
                })?,
            None => None,
        };

        let gid = match group {
            Some(token) => resolver
                .resolve_group(token)
                .map_err(|source| ValidationError::InvalidGroup {
                    token: token.to_string(),
                    source,
                })?,
            None => None,
        };

        ChangeSpec::from_changes(mode, uid, gid, self.recursive)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Parse an octal mode string into the nine rwx bits.
///
/// The value must be octal digits only; surrounding whitespace is rejected.
/// Anything above `0o777` that still fits in 32 bits is accepted and masked,
/// so `"1755"` yields `0o755`.
///
/// # Errors
///
/// [`ValidationError::InvalidMode`] for blank input, whitespace, non-octal
/// digits, signs, or values that overflow 32 bits.
///
/// # Example
///
/// ```rust
/// use anyfs_permissions::parse_mode;
///
/// assert_eq!(parse_mode("644").unwrap().mode(), 0o644);
/// assert!(parse_mode("rwx").is_err());
/// assert!(parse_mode(" 644").is_err());
/// ```
pub fn parse_mode(value: &str) -> Result<Permissions, ValidationError> {
    let invalid = || ValidationError::InvalidMode {
        value: value.to_string(),
    };

    if value.is_empty() || !value.bytes().all(|b| matches!(b, b'0'..=b'7')) {
        return Err(invalid());
    }

    let bits = u32::from_str_radix(value, 8).map_err(|_| invalid())?;
    Ok(Permissions::from_request_bits(bits))
}

/// A validated, immutable permission change.
///
/// At least one of mode, owner or group is always present. An owner or
/// group may be present as [`IdentityChange::Keep`], which counts as a
/// requested change but leaves the attribute alone. Symlinks are always
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSpec {
    mode: Option<Permissions>,
    owner: Option<IdentityChange>,
    group: Option<IdentityChange>,
    recursive: bool,
    skip_symlinks: bool,
}

impl ChangeSpec {
    /// Build a spec directly from resolved values.
    ///
    /// `mode` is narrowed to its nine rwx bits. An id of `u32::MAX` is the
    /// unchanged sentinel.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NoChangesRequested`] if all three changes are `None`.
    pub fn new(
        mode: Option<Permissions>,
        owner: Option<u32>,
        group: Option<u32>,
        recursive: bool,
    ) -> Result<Self, ValidationError> {
        Self::from_changes(
            mode,
            owner.map(IdentityChange::from_id),
            group.map(IdentityChange::from_id),
            recursive,
        )
    }

    /// Build a spec from resolved identity changes.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NoChangesRequested`] if all three changes are `None`.
    pub fn from_changes(
        mode: Option<Permissions>,
        owner: Option<IdentityChange>,
        group: Option<IdentityChange>,
        recursive: bool,
    ) -> Result<Self, ValidationError> {
        if mode.is_none() && owner.is_none() && group.is_none() {
            return Err(ValidationError::NoChangesRequested);
        }
        Ok(Self {
            mode: mode.map(|m| Permissions::from_request_bits(m.mode())),
            owner,
            group,
            recursive,
            skip_symlinks: true,
        })
    }

    /// Requested mode, if any.
    pub fn mode(&self) -> Option<Permissions> {
        self.mode
    }

    /// Owner uid to set; `None` leaves the owner unchanged.
    pub fn owner(&self) -> Option<u32> {
        self.owner.and_then(IdentityChange::id)
    }

    /// Group gid to set; `None` leaves the group unchanged.
    pub fn group(&self) -> Option<u32> {
        self.group.and_then(IdentityChange::id)
    }

    /// The owner as requested, including [`IdentityChange::Keep`].
    pub fn owner_change(&self) -> Option<IdentityChange> {
        self.owner
    }

    /// The group as requested, including [`IdentityChange::Keep`].
    pub fn group_change(&self) -> Option<IdentityChange> {
        self.group
    }

    /// Whether descendants of the root are changed too.
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Whether symlinks are skipped. Always `true`.
    pub fn skip_symlinks(&self) -> bool {
        self.skip_symlinks
    }

    /// Whether an ownership change is part of this spec.
    ///
    /// True for a present [`IdentityChange::Keep`] too; the backend then
    /// gets `None` for that id.
    pub fn changes_ownership(&self) -> bool {
        self.owner.is_some() || self.group.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IdentityError, IdentityKind};
    use crate::identity::IdentityTable;

    fn ids() -> IdentityTable {
        IdentityTable::new()
            .with_user("alice", 1001)
            .with_group("staff", 50)
    }

    #[test]
    fn parse_mode_accepts_every_three_digit_octal() {
        for bits in 0..=0o777u32 {
            let text = format!("{bits:03o}");
            assert_eq!(parse_mode(&text).unwrap().mode(), bits, "{text}");
        }
    }

    #[test]
    fn parse_mode_masks_to_nine_bits() {
        assert_eq!(parse_mode("1755").unwrap().mode(), 0o755);
        assert_eq!(parse_mode("4777").unwrap().mode(), 0o777);
        assert_eq!(parse_mode("7").unwrap().mode(), 0o7);
    }

    #[test]
    fn parse_mode_rejects_garbage() {
        for value in ["", "   ", "8", "759", "rwx", "0x1ff", "-755", "+755", "7 5 5", " 640 ", "640\n"] {
            let err = parse_mode(value).unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidMode {
                    value: value.to_string()
                },
                "{value:?}"
            );
        }
    }

    #[test]
    fn parse_mode_rejects_overflow() {
        // 0o77777777777 > u32::MAX
        assert!(parse_mode("77777777777").is_err());
        assert_eq!(parse_mode("37777777777").unwrap().mode(), 0o777);
    }

    #[test]
    fn all_blank_is_no_changes() {
        let req = ChangeRequest::new().mode("").owner("").group("");
        assert_eq!(
            req.into_spec(&ids()).unwrap_err(),
            ValidationError::NoChangesRequested
        );
        assert_eq!(
            ChangeRequest::new().recursive(true).into_spec(&ids()).unwrap_err(),
            ValidationError::NoChangesRequested
        );
    }

    #[test]
    fn any_single_field_is_enough() {
        let spec = ChangeRequest::new().mode("700").into_spec(&ids()).unwrap();
        assert_eq!(spec.mode(), Some(Permissions::from_mode(0o700)));
        assert!(!spec.changes_ownership());

        let spec = ChangeRequest::new().owner("alice").into_spec(&ids()).unwrap();
        assert_eq!(spec.owner(), Some(1001));
        assert_eq!(spec.group(), None);
        assert_eq!(spec.mode(), None);

        let spec = ChangeRequest::new().group("50").into_spec(&ids()).unwrap();
        assert_eq!(spec.group(), Some(50));
        assert!(spec.changes_ownership());
    }

    #[test]
    fn padded_mode_is_invalid() {
        let err = ChangeRequest::new()
            .mode(" 640 ")
            .into_spec(&ids())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidMode {
                value: " 640 ".into()
            }
        );
    }

    #[test]
    fn minus_one_owner_is_a_request_that_keeps_the_owner() {
        let spec = ChangeRequest::new().owner("-1").into_spec(&ids()).unwrap();
        assert_eq!(spec.owner_change(), Some(IdentityChange::Keep));
        assert_eq!(spec.owner(), None);
        assert_eq!(spec.group_change(), None);
        assert!(spec.changes_ownership());

        let spec = ChangeRequest::new()
            .owner("alice")
            .group("-1")
            .into_spec(&ids())
            .unwrap();
        assert_eq!(spec.owner(), Some(1001));
        assert_eq!(spec.group_change(), Some(IdentityChange::Keep));
        assert_eq!(spec.group(), None);
    }

    #[test]
    fn spec_new_treats_max_id_as_keep() {
        let spec = ChangeSpec::new(None, Some(u32::MAX), None, false).unwrap();
        assert_eq!(spec.owner_change(), Some(IdentityChange::Keep));
        assert_eq!(spec.owner(), None);
    }

    #[test]
    fn blank_fields_are_ignored_next_to_set_ones() {
        let spec = ChangeRequest::new()
            .mode("  ")
            .owner("")
            .group("staff")
            .into_spec(&ids())
            .unwrap();
        assert_eq!(spec.mode(), None);
        assert_eq!(spec.owner(), None);
        assert_eq!(spec.group(), Some(50));
    }

    #[test]
    fn invalid_mode_names_value() {
        let err = ChangeRequest::new()
            .mode("999")
            .into_spec(&ids())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid mode \"999\" (expect octal, e.g. 755)");
    }

    #[test]
    fn unknown_owner_names_token() {
        let err = ChangeRequest::new()
            .owner("mallory")
            .into_spec(&ids())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidOwner {
                token: "mallory".into(),
                source: IdentityError::Unknown {
                    kind: IdentityKind::User,
                    name: "mallory".into(),
                },
            }
        );
    }

    #[test]
    fn unknown_group_names_token() {
        let err = ChangeRequest::new()
            .mode("755")
            .group("wheel")
            .into_spec(&ids())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGroup { ref token, .. } if token == "wheel"));
    }

    #[test]
    fn recursive_is_copied_and_symlinks_are_skipped() {
        let spec = ChangeRequest::new()
            .mode("755")
            .recursive(true)
            .into_spec(&ids())
            .unwrap();
        assert!(spec.recursive());
        assert!(spec.skip_symlinks());

        let spec = ChangeRequest::new().mode("755").into_spec(&ids()).unwrap();
        assert!(!spec.recursive());
        assert!(spec.skip_symlinks());
    }

    #[test]
    fn spec_new_enforces_at_least_one_change() {
        assert_eq!(
            ChangeSpec::new(None, None, None, true).unwrap_err(),
            ValidationError::NoChangesRequested
        );
        let spec = ChangeSpec::new(Some(Permissions::from_mode(0o4755)), None, None, false).unwrap();
        assert_eq!(spec.mode().unwrap().mode(), 0o755);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn request_from_json() {
        let req = ChangeRequest::from_json(r#"{"mode":"640","owner":"","recursive":true}"#).unwrap();
        assert_eq!(req.mode.as_deref(), Some("640"));
        assert_eq!(req.owner.as_deref(), Some(""));
        assert_eq!(req.group, None);
        assert!(req.recursive);

        let spec = req.into_spec(&ids()).unwrap();
        assert_eq!(spec.owner(), None);
    }
}
