use serde::Serialize;
use thiserror::Error;

use appvault_core::AppId;

use crate::{Claims, Permission, RoleTable};

/// Why an authenticated caller was denied.
///
/// The `Display` text is internal (logs, audit). Callers only ever see a
/// generic "access denied" so the failing check is not revealed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("insufficient privilege: missing permission '{0}'")]
    InsufficientPrivilege(Permission),

    #[error("not resource owner: caller '{caller}' targeted '{target}'")]
    NotResourceOwner { caller: AppId, target: AppId },
}

impl AuthzError {
    pub fn kind(&self) -> DenialKind {
        match self {
            AuthzError::InsufficientPrivilege(_) => DenialKind::InsufficientPrivilege,
            AuthzError::NotResourceOwner { .. } => DenialKind::NotResourceOwner,
        }
    }
}

/// Decide whether `claims` may exercise `required` on `target`.
///
/// Two stages, always both:
/// 1. the caller's role must grant `required` (unknown roles grant nothing);
/// 2. a non-admin caller may only target its own app.
///
/// - No IO
/// - No panics
pub fn authorize(
    table: &RoleTable,
    claims: &Claims,
    required: &Permission,
    target: Option<&AppId>,
) -> Result<(), AuthzError> {
    if !table.grants(&claims.role, required) {
        return Err(AuthzError::InsufficientPrivilege(required.clone()));
    }

    if let Some(target) = target {
        if !claims.role.is_admin() && *target != claims.app_id {
            return Err(AuthzError::NotResourceOwner {
                caller: claims.app_id.clone(),
                target: target.clone(),
            });
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision for the caller itself.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The permission that was being checked.
    pub required_permission: String,

    /// The target app, if any.
    pub target: Option<String>,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub app_id: String,
    pub role: String,

    /// Literal permissions of the caller's role, sorted.
    pub effective_permissions: Vec<String>,

    /// If denied, this explains what was missing.
    pub denial: Option<DenialReason>,
}

/// Detailed reason why authorization was denied.
#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    InsufficientPrivilege,
    NotResourceOwner,
}

/// Explain why [`authorize`] would allow or deny a request.
///
/// Always agrees with [`authorize`]; only the caller's own role and id are
/// described.
pub fn explain_authorization(
    table: &RoleTable,
    claims: &Claims,
    required: &Permission,
    target: Option<&AppId>,
) -> AuthorizationExplanation {
    let permissions = table.permissions_for(&claims.role);
    let effective_permissions: Vec<String> =
        permissions.iter().map(|p| p.as_str().to_string()).collect();

    let decision = authorize(table, claims, required, target);

    let (granted, reason, denial) = match decision {
        Ok(()) => {
            let reason = if permissions.contains(required) {
                format!("Role '{}' grants '{}'", claims.role, required)
            } else {
                format!(
                    "Role '{}' grants the broader form of '{}'",
                    claims.role, required
                )
            };
            let reason = match target {
                Some(t) if claims.role.is_admin() => format!("{reason}; admin may target '{t}'"),
                Some(t) => format!("{reason}; '{t}' is the caller's own app"),
                None => reason,
            };
            (true, reason, None)
        }
        Err(AuthzError::InsufficientPrivilege(p)) => (
            false,
            format!(
                "Role '{}' does not grant '{}'. Current permissions: {:?}",
                claims.role, p, effective_permissions
            ),
            Some(DenialReason {
                kind: DenialKind::InsufficientPrivilege,
                message: format!("Missing required permission: '{p}'"),
            }),
        ),
        Err(AuthzError::NotResourceOwner { caller, target }) => (
            false,
            format!(
                "Role '{}' may only act on its own app ('{caller}'), not '{target}'",
                claims.role
            ),
            Some(DenialReason {
                kind: DenialKind::NotResourceOwner,
                message: "Only admins may act on other apps".to_string(),
            }),
        ),
    };

    AuthorizationExplanation {
        required_permission: required.as_str().to_string(),
        target: target.map(|t| t.as_str().to_string()),
        granted,
        reason,
        app_id: claims.app_id.as_str().to_string(),
        role: claims.role.as_str().to_string(),
        effective_permissions,
        denial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::permissions::{
        CREATE_PASSWORD, READ_APPS, READ_OWN_PASSWORD, READ_PASSWORD, UPDATE_APPS,
        UPDATE_OWN_PASSWORD, UPDATE_PASSWORD,
    };
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn id(s: &str) -> AppId {
        AppId::new(s).unwrap()
    }

    fn claims(app: &str, role: Role) -> Claims {
        let now = Utc::now();
        Claims {
            app_id: id(app),
            role,
            issued_at: now,
            expires_at: now + Duration::hours(1),
        }
    }

    #[test]
    fn client_updates_own_password_only() {
        let table = RoleTable::default();
        let c = claims("u1", Role::Client);

        assert_eq!(authorize(&table, &c, &UPDATE_OWN_PASSWORD, Some(&id("u1"))), Ok(()));
        assert_eq!(
            authorize(&table, &c, &UPDATE_OWN_PASSWORD, Some(&id("u2"))),
            Err(AuthzError::NotResourceOwner { caller: id("u1"), target: id("u2") })
        );
    }

    #[test]
    fn ownership_applies_even_when_literal_permission_matches() {
        // create:password is granted to clients verbatim; the target check
        // still confines them to their own app.
        let table = RoleTable::default();
        let c = claims("u1", Role::Client);
        assert!(matches!(
            authorize(&table, &c, &CREATE_PASSWORD, Some(&id("u2"))),
            Err(AuthzError::NotResourceOwner { .. })
        ));
        assert_eq!(authorize(&table, &c, &CREATE_PASSWORD, Some(&id("u1"))), Ok(()));
    }

    #[test]
    fn admin_may_target_any_app() {
        let table = RoleTable::default();
        let a = claims("root", Role::Admin);
        for required in [CREATE_PASSWORD, UPDATE_OWN_PASSWORD, READ_OWN_PASSWORD] {
            assert_eq!(authorize(&table, &a, &required, Some(&id("u2"))), Ok(()));
        }
        assert_eq!(authorize(&table, &a, &READ_APPS, None), Ok(()));
    }

    #[test]
    fn client_cannot_list_apps() {
        let table = RoleTable::default();
        let c = claims("u1", Role::Client);
        assert_eq!(
            authorize(&table, &c, &READ_APPS, None),
            Err(AuthzError::InsufficientPrivilege(READ_APPS))
        );
    }

    #[test]
    fn privilege_is_checked_before_ownership() {
        let table = RoleTable::default();
        let p = claims("u1", Role::Public);
        assert_eq!(
            authorize(&table, &p, &READ_OWN_PASSWORD, Some(&id("u2"))),
            Err(AuthzError::InsufficientPrivilege(READ_OWN_PASSWORD))
        );
    }

    #[test]
    fn explanation_agrees_with_decision() {
        let table = RoleTable::default();
        let c = claims("u1", Role::Client);

        let allowed = explain_authorization(&table, &c, &READ_OWN_PASSWORD, Some(&id("u1")));
        assert!(allowed.granted);
        assert!(allowed.denial.is_none());

        let denied = explain_authorization(&table, &c, &READ_OWN_PASSWORD, Some(&id("u2")));
        assert!(!denied.granted);
        assert_eq!(denied.denial.unwrap().kind, DenialKind::NotResourceOwner);

        let missing = explain_authorization(&table, &c, &READ_APPS, None);
        assert_eq!(missing.denial.unwrap().kind, DenialKind::InsufficientPrivilege);
        assert_eq!(missing.effective_permissions.len(), 3);
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::Admin),
            Just(Role::Client),
            Just(Role::Public),
            "[a-z]{1,8}".prop_map(Role::from),
        ]
    }

    fn any_permission() -> impl Strategy<Value = Permission> {
        prop_oneof![
            Just(CREATE_PASSWORD),
            Just(UPDATE_PASSWORD),
            Just(READ_PASSWORD),
            Just(UPDATE_OWN_PASSWORD),
            Just(READ_OWN_PASSWORD),
            Just(READ_APPS),
            Just(UPDATE_APPS),
            Just(Permission::new("read:own:apps")),
            Just(Permission::new("update:own:apps")),
            "[a-z]{1,6}:[a-z]{1,6}".prop_map(Permission::new),
            "[a-z]{1,6}:own:[a-z]{1,6}".prop_map(Permission::new),
        ]
    }

    /// Written out by hand from the default table: admin's broad grants
    /// cover the `own` forms clients list, and nothing else is implied.
    fn expected_grant(role: &Role, required: &Permission) -> bool {
        match role {
            Role::Admin => matches!(
                required.as_str(),
                "create:password"
                    | "update:password"
                    | "read:password"
                    | "read:apps"
                    | "update:apps"
                    | "update:own:password"
                    | "read:own:password"
            ),
            Role::Client => matches!(
                required.as_str(),
                "create:password" | "read:own:password" | "update:own:password"
            ),
            Role::Public | Role::Other(_) => false,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: allowed iff the role grants the permission AND
        /// (admin OR no target OR target is the caller).
        #[test]
        fn allow_iff_granted_and_owner_or_admin(
            role in any_role(),
            required in any_permission(),
            caller in prop_oneof![Just("u1"), Just("u2"), Just("u3")],
            target in proptest::option::of(prop_oneof![Just("u1"), Just("u2"), Just("u3")]),
        ) {
            let table = RoleTable::default();
            let c = claims(caller, role.clone());
            let target = target.map(id);

            let granted = expected_grant(&role, &required);
            let owner_ok = role.is_admin() || target.as_ref().is_none_or(|t| *t == c.app_id);

            let decision = authorize(&table, &c, &required, target.as_ref());
            prop_assert_eq!(decision.is_ok(), granted && owner_ok);

            let explanation = explain_authorization(&table, &c, &required, target.as_ref());
            prop_assert_eq!(explanation.granted, decision.is_ok());
        }

        /// Property: a permission no role lists is denied to every role.
        #[test]
        fn unlisted_permissions_are_never_granted(
            role in any_role(),
            required in any_permission(),
        ) {
            let table = RoleTable::default();
            if !table.all_permissions().contains(&required) {
                let c = claims("u1", role);
                prop_assert_eq!(
                    authorize(&table, &c, &required, None),
                    Err(AuthzError::InsufficientPrivilege(required.clone()))
                );
            }
        }
    }
}
