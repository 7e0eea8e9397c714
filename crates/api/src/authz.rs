//! Request-level authorization.
//!
//! Runs before any handler touches the registry: verify the credential, then
//! apply the two-stage decision against the route's permission and target.

use chrono::Utc;

use appvault_auth::{Claims, Permission, authorize};
use appvault_core::AppId;
use appvault_observability::{AuditEvent, AuditOutcome};
use appvault_registry::record::MSG_INVALID_APP_ID;

use crate::app::errors::ApiError;
use crate::context::RequestContext;
use crate::middleware::AuthState;

/// Authenticate the request and, when `required` is given, authorize it.
///
/// Returns the verified claims on success. A denial is audited with its
/// internal reason; the caller only ever sees the generic message.
pub fn authorize_request(
    auth: &AuthState,
    ctx: &RequestContext,
    required: Option<&Permission>,
) -> Result<Claims, ApiError> {
    let claims = auth
        .verifier
        .verify(ctx.credential(), Utc::now())
        .map_err(ApiError::Unauthenticated)?;

    let Some(required) = required else {
        return Ok(claims);
    };

    let target = ctx
        .target_app_id()
        .map(AppId::new)
        .transpose()
        .map_err(|_| ApiError::BadRequest(MSG_INVALID_APP_ID.to_string()))?;

    match authorize(&auth.roles, &claims, required, target.as_ref()) {
        Ok(()) => {
            auth.audit.record(
                AuditEvent::new("authorize", AuditOutcome::Success)
                    .app(claims.app_id.as_str())
                    .role(claims.role.as_str())
                    .detail(required.as_str()),
            );
            Ok(claims)
        }
        Err(e) => {
            tracing::info!(
                app_id = %claims.app_id,
                role = %claims.role,
                permission = %required,
                reason = ?e.kind(),
                "request denied"
            );
            auth.audit.record(
                AuditEvent::new("authorize", AuditOutcome::Denied)
                    .app(claims.app_id.as_str())
                    .role(claims.role.as_str())
                    .detail(e.to_string()),
            );
            Err(ApiError::Forbidden(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use appvault_auth::{CredentialIssuer, Hs256Credentials, Role, RoleTable, permissions};
    use appvault_observability::MemoryAuditSink;

    use super::*;

    fn setup() -> (AuthState, Hs256Credentials, Arc<MemoryAuditSink>) {
        let audit = Arc::new(MemoryAuditSink::new());
        let creds = Hs256Credentials::new(b"test-secret", Duration::minutes(5), audit.clone());
        let auth = AuthState {
            verifier: Arc::new(Hs256Credentials::new(
                b"test-secret",
                Duration::minutes(5),
                audit.clone(),
            )),
            roles: Arc::new(RoleTable::default()),
            audit: audit.clone(),
        };
        (auth, creds, audit)
    }

    fn bearer(creds: &Hs256Credentials, app: &str, role: Role) -> String {
        let token = creds
            .issue(&AppId::new(app).unwrap(), &role, Utc::now())
            .unwrap();
        format!("Bearer {token}")
    }

    #[test]
    fn missing_credential_is_unauthenticated() {
        let (auth, _, _) = setup();
        let ctx = RequestContext::new(None, Some("u1".into()));
        let err = authorize_request(&auth, &ctx, Some(&permissions::UPDATE_OWN_PASSWORD)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn client_is_confined_to_its_own_app() {
        let (auth, creds, audit) = setup();
        let token = bearer(&creds, "u1", Role::Client);

        let other = RequestContext::new(Some(token.clone()), Some("u2".into()));
        let err = authorize_request(&auth, &other, Some(&permissions::UPDATE_OWN_PASSWORD)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let own = RequestContext::new(Some(token), Some("u1".into()));
        let claims = authorize_request(&auth, &own, Some(&permissions::UPDATE_OWN_PASSWORD)).unwrap();
        assert_eq!(claims.app_id.as_str(), "u1");

        let decisions = audit.named("authorize");
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].outcome, AuditOutcome::Denied);
        assert_eq!(decisions[1].outcome, AuditOutcome::Success);
    }

    #[test]
    fn admin_may_target_any_app() {
        let (auth, creds, _) = setup();
        let ctx = RequestContext::new(Some(bearer(&creds, "root", Role::Admin)), Some("u2".into()));
        assert!(authorize_request(&auth, &ctx, Some(&permissions::READ_OWN_PASSWORD)).is_ok());
    }

    #[test]
    fn authentication_only_skips_the_decision() {
        let (auth, creds, audit) = setup();
        let ctx = RequestContext::new(Some(bearer(&creds, "p1", Role::Public)), None);
        assert!(authorize_request(&auth, &ctx, None).is_ok());
        assert!(audit.named("authorize").is_empty());
    }
}
