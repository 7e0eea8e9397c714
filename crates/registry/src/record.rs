use chrono::{DateTime, Utc};
use serde::Serialize;

use appvault_auth::Role;
use appvault_core::{AppId, DomainError, DomainResult};

pub const MSG_FIELDS_MANDATORY: &str = "All fields are mandatory.";
pub const MSG_PASSWORD_MANDATORY: &str = "Password is mandatory.";
pub const MSG_INVALID_APP_ID: &str = "Invalid app id.";

/// Output of the one-way hasher. Never a plaintext.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SecretHash(String);

impl SecretHash {
    pub(crate) fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretHash(..)")
    }
}

/// A registered app and its single password slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRecord {
    pub app_id: AppId,
    pub name: String,
    /// `None` only for apps imported from the external directory.
    pub secret_hash: Option<SecretHash>,
    /// Non-empty; the first entry is the primary role.
    pub roles: Vec<Role>,
    /// Absent until created; never reverts to absent.
    pub password_hash: Option<SecretHash>,
    pub registered_at: DateTime<Utc>,
}

impl AppRecord {
    pub fn primary_role(&self) -> &Role {
        static FALLBACK: Role = Role::Public;
        // `roles` is non-empty by construction.
        self.roles.first().unwrap_or(&FALLBACK)
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Validated registration input. Plaintexts live here only until hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct NewApp {
    pub(crate) app_id: AppId,
    pub(crate) name: String,
    pub(crate) secret: String,
    pub(crate) role: Role,
    pub(crate) password: Option<String>,
}

impl NewApp {
    /// `app_id`, `name` and `secret` must be non-blank. A supplied
    /// `password` must be non-blank too; omitting it leaves the password
    /// slot empty for a later create.
    pub fn new(
        app_id: &str,
        name: &str,
        secret: &str,
        role: Role,
        password: Option<&str>,
    ) -> DomainResult<Self> {
        if [app_id, name, secret].iter().any(|f| f.trim().is_empty()) {
            return Err(DomainError::validation(MSG_FIELDS_MANDATORY));
        }
        let app_id = AppId::new(app_id).map_err(|_| DomainError::validation(MSG_INVALID_APP_ID))?;
        if password.is_some_and(|p| p.trim().is_empty()) {
            return Err(DomainError::validation(MSG_PASSWORD_MANDATORY));
        }

        Ok(Self {
            app_id,
            name: name.trim().to_string(),
            secret: secret.to_string(),
            role,
            password: password.map(str::to_string),
        })
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

impl core::fmt::Debug for NewApp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewApp")
            .field("app_id", &self.app_id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("password", &self.password.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}
