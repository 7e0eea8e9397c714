//! Static role → permission table.

use std::collections::{BTreeSet, HashMap};

use crate::permissions::{
    CREATE_PASSWORD, READ_APPS, READ_OWN_PASSWORD, READ_PASSWORD, UPDATE_APPS,
    UPDATE_OWN_PASSWORD, UPDATE_PASSWORD,
};
use crate::{Permission, PermissionSet, Role};

/// Maps each known role to its granted permissions.
///
/// Built once at process start and shared read-only. Roles missing from the
/// table (including every [`Role::Other`]) resolve to the empty set.
#[derive(Debug, Clone)]
pub struct RoleTable {
    roles: HashMap<Role, PermissionSet>,
    /// Union of every role's set.
    defined: BTreeSet<Permission>,
    empty: PermissionSet,
}

impl RoleTable {
    pub fn new(roles: impl IntoIterator<Item = (Role, PermissionSet)>) -> Self {
        let roles: HashMap<Role, PermissionSet> = roles.into_iter().collect();
        let defined = roles
            .values()
            .flat_map(|set| set.iter().cloned())
            .collect();
        Self {
            roles,
            defined,
            empty: PermissionSet::empty(),
        }
    }

    pub fn permissions_for(&self, role: &Role) -> &PermissionSet {
        self.roles.get(role).unwrap_or(&self.empty)
    }

    /// Whether `role` satisfies `required`.
    ///
    /// A literal grant always satisfies. A grant of `verb:resource` also
    /// satisfies `verb:own:resource`, but only when that `own` form is itself
    /// listed by some role; a permission no role lists is never granted.
    pub fn grants(&self, role: &Role, required: &Permission) -> bool {
        let set = self.permissions_for(role);
        if set.contains(required) {
            return true;
        }
        self.defined.contains(required)
            && required.broad().is_some_and(|broad| set.contains(&broad))
    }

    /// Every permission granted by at least one role, sorted.
    pub fn all_permissions(&self) -> Vec<Permission> {
        self.defined.iter().cloned().collect()
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::new([
            (
                Role::Admin,
                [CREATE_PASSWORD, UPDATE_PASSWORD, READ_PASSWORD, READ_APPS, UPDATE_APPS]
                    .into_iter()
                    .collect(),
            ),
            (
                Role::Client,
                [CREATE_PASSWORD, READ_OWN_PASSWORD, UPDATE_OWN_PASSWORD]
                    .into_iter()
                    .collect(),
            ),
            (Role::Public, PermissionSet::empty()),
        ])
    }
}

/// Permissions the HTTP surface requires somewhere. Each must be satisfiable
/// by at least one role in the default table.
pub const ROUTE_PERMISSIONS: [Permission; 5] = [
    CREATE_PASSWORD,
    UPDATE_OWN_PASSWORD,
    READ_OWN_PASSWORD,
    READ_APPS,
    UPDATE_APPS,
];
