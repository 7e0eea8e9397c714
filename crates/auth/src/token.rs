//! Signed bearer credentials (HS256 JWT).
//!
//! Minting happens at registration; verification on every protected call.
//! The signing secret is fixed for the lifetime of the process.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appvault_core::AppId;
use appvault_observability::{AuditEvent, AuditOutcome, AuditSink};

use crate::claims::{TokenValidationError, validate_claims};
use crate::{Claims, Role};

/// Why a credential could not be turned into [`Claims`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthnError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("credential has expired")]
    ExpiredCredential,
}

impl AuthnError {
    fn kind(&self) -> &'static str {
        match self {
            AuthnError::MissingCredential => "missing_credential",
            AuthnError::InvalidCredential(_) => "invalid_credential",
            AuthnError::ExpiredCredential => "expired_credential",
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign credential: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Verify a presented credential.
pub trait CredentialVerifier: Send + Sync {
    /// `credential` is the raw header value; a leading scheme label such as
    /// `Bearer` is stripped by splitting on the first whitespace.
    fn verify(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<Claims, AuthnError>;
}

/// Mint credentials for registered apps.
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, app_id: &AppId, role: &Role, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Wire payload. Field names match what existing clients already decode.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    appid: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// HS256 issuer + verifier sharing one process-wide secret.
#[derive(Clone)]
pub struct Hs256Credentials {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    audit: Arc<dyn AuditSink>,
}

impl Hs256Credentials {
    pub fn new(secret: &[u8], ttl: Duration, audit: Arc<dyn AuditSink>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller-supplied clock in `validate_claims`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
            audit,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthnError> {
        let data = jsonwebtoken::decode::<TokenPayload>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthnError::ExpiredCredential,
                _ => AuthnError::InvalidCredential(e.to_string()),
            })?;
        let payload = data.claims;

        let app_id = AppId::new(&payload.appid)
            .map_err(|e| AuthnError::InvalidCredential(e.to_string()))?;
        let issued_at = DateTime::from_timestamp(payload.iat, 0)
            .ok_or_else(|| AuthnError::InvalidCredential("iat out of range".to_string()))?;
        let expires_at = DateTime::from_timestamp(payload.exp, 0)
            .ok_or_else(|| AuthnError::InvalidCredential("exp out of range".to_string()))?;

        let claims = Claims {
            app_id,
            role: payload.role,
            issued_at,
            expires_at,
        };

        validate_claims(&claims, now).map_err(|e| match e {
            TokenValidationError::Expired => AuthnError::ExpiredCredential,
            other => AuthnError::InvalidCredential(other.to_string()),
        })?;

        Ok(claims)
    }
}

impl core::fmt::Debug for Hs256Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Credentials")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier for Hs256Credentials {
    fn verify(&self, credential: Option<&str>, now: DateTime<Utc>) -> Result<Claims, AuthnError> {
        let result = credential
            .and_then(strip_scheme)
            .ok_or(AuthnError::MissingCredential)
            .and_then(|token| self.decode(token, now));

        match &result {
            Ok(claims) => {
                self.audit.record(
                    AuditEvent::new("authenticate", AuditOutcome::Success)
                        .app(claims.app_id.as_str())
                        .role(claims.role.as_str()),
                );
            }
            Err(err) => {
                tracing::debug!(error = %err, "credential rejected");
                self.audit.record(
                    AuditEvent::new("authenticate", AuditOutcome::Failure).detail(err.kind()),
                );
            }
        }

        result
    }
}

impl CredentialIssuer for Hs256Credentials {
    fn issue(&self, app_id: &AppId, role: &Role, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let payload = TokenPayload {
            appid: app_id.as_str().to_string(),
            role: role.clone(),
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)?;
        Ok(token)
    }
}

/// Drop a leading scheme label (`Bearer <token>` → `<token>`).
///
/// A value without whitespace is taken as the bare token. Blank input, or a
/// scheme with nothing after it, counts as no credential.
fn strip_scheme(raw: &str) -> Option<&str> {
    let raw = raw.trim_start();
    let token = match raw.split_once(char::is_whitespace) {
        Some((_scheme, rest)) => rest.trim(),
        None => raw,
    };
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appvault_observability::MemoryAuditSink;

    const SECRET: &[u8] = b"test-secret";

    fn credentials(audit: Arc<MemoryAuditSink>) -> Hs256Credentials {
        Hs256Credentials::new(SECRET, Duration::hours(1), audit)
    }

    fn app(id: &str) -> AppId {
        AppId::new(id).unwrap()
    }

    #[test]
    fn issued_credential_verifies_with_scheme() {
        let audit = Arc::new(MemoryAuditSink::new());
        let creds = credentials(audit.clone());
        let now = Utc::now();

        let token = creds.issue(&app("u1"), &Role::Client, now).unwrap();
        let claims = creds.verify(Some(&format!("Bearer {token}")), now).unwrap();

        assert_eq!(claims.app_id, app("u1"));
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(1));

        let events = audit.named("authenticate");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].outcome, AuditOutcome::Success);
        assert_eq!(events[0].app_id.as_deref(), Some("u1"));
    }

    #[test]
    fn bare_token_is_accepted() {
        let creds = credentials(Arc::new(MemoryAuditSink::new()));
        let now = Utc::now();
        let token = creds.issue(&app("u1"), &Role::Admin, now).unwrap();
        assert!(creds.verify(Some(&token), now).is_ok());
    }

    #[test]
    fn missing_credential() {
        let audit = Arc::new(MemoryAuditSink::new());
        let creds = credentials(audit.clone());
        let now = Utc::now();

        assert_eq!(creds.verify(None, now), Err(AuthnError::MissingCredential));
        assert_eq!(creds.verify(Some("   "), now), Err(AuthnError::MissingCredential));
        assert_eq!(creds.verify(Some("Bearer "), now), Err(AuthnError::MissingCredential));

        let events = audit.named("authenticate");
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.outcome == AuditOutcome::Failure));
        assert_eq!(events[0].detail.as_deref(), Some("missing_credential"));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let now = Utc::now();
        let other = Hs256Credentials::new(b"other", Duration::hours(1), Arc::new(MemoryAuditSink::new()));
        let token = other.issue(&app("u1"), &Role::Admin, now).unwrap();

        let creds = credentials(Arc::new(MemoryAuditSink::new()));
        assert!(matches!(
            creds.verify(Some(&token), now),
            Err(AuthnError::InvalidCredential(_))
        ));
    }

    #[test]
    fn malformed_token_is_invalid() {
        let creds = credentials(Arc::new(MemoryAuditSink::new()));
        assert!(matches!(
            creds.verify(Some("Bearer not.a.jwt"), Utc::now()),
            Err(AuthnError::InvalidCredential(_))
        ));
    }

    #[test]
    fn expired_credential() {
        let creds = credentials(Arc::new(MemoryAuditSink::new()));
        let issued = Utc::now() - Duration::hours(2);
        let token = creds.issue(&app("u1"), &Role::Client, issued).unwrap();

        assert_eq!(
            creds.verify(Some(&token), Utc::now()),
            Err(AuthnError::ExpiredCredential)
        );
    }

    #[test]
    fn unknown_role_survives_verification() {
        let creds = credentials(Arc::new(MemoryAuditSink::new()));
        let now = Utc::now();
        let token = creds.issue(&app("u1"), &Role::from("auditor"), now).unwrap();
        let claims = creds.verify(Some(&token), now).unwrap();
        assert_eq!(claims.role, Role::Other("auditor".to_string()));
    }

    #[test]
    fn strip_scheme_cases() {
        assert_eq!(strip_scheme("Bearer abc"), Some("abc"));
        assert_eq!(strip_scheme("  Bearer   abc  "), Some("abc"));
        assert_eq!(strip_scheme("abc"), Some("abc"));
        assert_eq!(strip_scheme("Bearer"), Some("Bearer"));
        assert_eq!(strip_scheme("Bearer "), None);
        assert_eq!(strip_scheme(""), None);
    }
}
