use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque `verb:resource` strings (e.g. `"read:apps"`). A
/// three-part `verb:own:resource` permission is the self-scoped form of
/// `verb:resource`: it only makes sense together with the ownership check in
/// [`crate::authorize`]. How the two forms relate is decided by
/// [`crate::RoleTable::grants`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

pub const CREATE_PASSWORD: Permission = Permission::from_static("create:password");
pub const UPDATE_PASSWORD: Permission = Permission::from_static("update:password");
pub const READ_PASSWORD: Permission = Permission::from_static("read:password");
pub const UPDATE_OWN_PASSWORD: Permission = Permission::from_static("update:own:password");
pub const READ_OWN_PASSWORD: Permission = Permission::from_static("read:own:password");
pub const READ_APPS: Permission = Permission::from_static("read:apps");
pub const UPDATE_APPS: Permission = Permission::from_static("update:apps");

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The broad form of a self-scoped permission.
    ///
    /// `update:own:password` → `update:password`; `None` for anything that is
    /// not exactly `verb:own:resource`.
    pub fn broad(&self) -> Option<Permission> {
        let mut parts = self.as_str().split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(verb), Some("own"), Some(resource), None)
                if !verb.is_empty() && !resource.is_empty() =>
            {
                Some(Permission::new(format!("{verb}:{resource}")))
            }
            _ => None,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The permissions granted to one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Literal membership.
    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broad_form_of_own_permissions() {
        assert_eq!(UPDATE_OWN_PASSWORD.broad(), Some(UPDATE_PASSWORD));
        assert_eq!(READ_OWN_PASSWORD.broad(), Some(READ_PASSWORD));
        assert_eq!(UPDATE_PASSWORD.broad(), None);
        assert_eq!(Permission::new("read:own").broad(), None);
        assert_eq!(Permission::new(":own:password").broad(), None);
        assert_eq!(Permission::new("a:own:b:c").broad(), None);
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = PermissionSet::empty();
        assert!(set.is_empty());
        assert!(!set.contains(&READ_APPS));
        assert!(!set.contains(&READ_OWN_PASSWORD));
    }
}
