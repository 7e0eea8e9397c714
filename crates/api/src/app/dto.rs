use serde::Deserialize;
use serde_json::{Value, json};

use appvault_auth::Role;
use appvault_registry::record::{MSG_FIELDS_MANDATORY, MSG_PASSWORD_MANDATORY};
use appvault_registry::{AppRecord, ImportSummary, NewApp};

use crate::app::errors::ApiError;

pub const MSG_UNKNOWN_ROLE: &str = "Unknown role.";
pub const MSG_PERMISSION_MANDATORY: &str = "Permission is mandatory.";

// -------------------------
// Request DTOs
// -------------------------

/// Registration body. Every field is optional at the wire level so a missing
/// field yields the stable validation message instead of a decoder error.
///
/// `role` is taken as given, `admin` included: registration is open, so any
/// caller can obtain an admin credential unless `POST /api/app` is gated
/// upstream.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub appid: Option<String>,
    pub name: Option<String>,
    pub secret: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl RegisterRequest {
    pub fn into_new_app(self) -> Result<NewApp, ApiError> {
        let (Some(appid), Some(name), Some(secret)) = (
            non_blank(self.appid),
            non_blank(self.name),
            non_blank(self.secret),
        ) else {
            return Err(ApiError::BadRequest(MSG_FIELDS_MANDATORY.to_string()));
        };

        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => Role::Client,
            Some(name) => Role::parse_known(name)
                .ok_or_else(|| ApiError::BadRequest(MSG_UNKNOWN_ROLE.to_string()))?,
        };

        Ok(NewApp::new(&appid, &name, &secret, role, self.password.as_deref())?)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

impl PasswordRequest {
    pub fn into_password(self) -> Result<String, ApiError> {
        non_blank(self.password).ok_or_else(|| ApiError::BadRequest(MSG_PASSWORD_MANDATORY.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: Option<String>,
    pub target: Option<String>,
    /// Subject app; defaults to the caller.
    pub appid: Option<String>,
    /// Subject role; defaults to the caller's. Unknown names are explained as-is.
    pub role: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// -------------------------
// Response mapping
// -------------------------

/// Public view of a record. Hashes are never part of it.
pub fn app_to_json(app: &AppRecord) -> Value {
    json!({
        "appid": app.app_id.as_str(),
        "name": app.name,
        "roles": app.roles.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "has_password": app.has_password(),
        "registered_at": app.registered_at.to_rfc3339(),
    })
}

pub fn import_summary_to_json(summary: &ImportSummary) -> Value {
    json!({
        "imported": summary.imported.len(),
        "skipped": summary.skipped.len(),
        "rejected": summary.rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(appid: &str, name: &str, secret: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            appid: Some(appid.into()),
            name: Some(name.into()),
            secret: Some(secret.into()),
            password: None,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn missing_fields_are_mandatory() {
        let err = RegisterRequest::default().into_new_app().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == MSG_FIELDS_MANDATORY));

        let err = request("a1", " ", "s", Some("nope")).into_new_app().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == MSG_FIELDS_MANDATORY));
    }

    #[test]
    fn role_defaults_to_client_and_unknown_is_rejected() {
        let app = request("a1", "N", "s", None).into_new_app().unwrap();
        assert_eq!(app.role(), &Role::Client);

        let app = request("a1", "N", "s", Some("Admin")).into_new_app().unwrap();
        assert_eq!(app.role(), &Role::Admin);

        let err = request("a1", "N", "s", Some("superuser")).into_new_app().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == MSG_UNKNOWN_ROLE));
    }

    #[test]
    fn blank_password_body_is_rejected() {
        let err = PasswordRequest { password: Some("  ".into()) }.into_password().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(m) if m == MSG_PASSWORD_MANDATORY));
        assert_eq!(
            PasswordRequest { password: Some("p1".into()) }.into_password().unwrap(),
            "p1"
        );
    }
}
