use std::sync::Arc;

use chrono::Utc;

use appvault_auth::{Claims, CredentialIssuer, Hs256Credentials, RoleTable};
use appvault_core::AppId;
use appvault_observability::{AuditEvent, AuditOutcome, AuditSink, TracingAuditSink};
use appvault_registry::{
    AppRecord, AppRegistry, BcryptHasher, ExternalDirectory, ImportSummary, NewApp, RegistryError,
    SecretHash, StubDirectory,
};

use crate::app::errors::ApiError;
use crate::config::{ConfigError, ENV_BCRYPT_COST, ServerConfig};
use crate::middleware::AuthState;

/// Everything a handler needs, owned once and shared behind an `Arc`.
pub struct AppServices {
    pub registry: AppRegistry,
    pub credentials: Arc<Hs256Credentials>,
    pub roles: Arc<RoleTable>,
    pub audit: Arc<dyn AuditSink>,
    pub directory: Arc<dyn ExternalDirectory>,
}

impl AppServices {
    pub fn new(
        registry: AppRegistry,
        credentials: Arc<Hs256Credentials>,
        roles: Arc<RoleTable>,
        audit: Arc<dyn AuditSink>,
        directory: Arc<dyn ExternalDirectory>,
    ) -> Self {
        Self {
            registry,
            credentials,
            roles,
            audit,
            directory,
        }
    }

    /// Production wiring: bcrypt at the configured cost, HS256 credentials,
    /// audit to the log, the stub directory.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let hasher = BcryptHasher::new(config.bcrypt_cost).map_err(|e| ConfigError::Invalid {
            var: ENV_BCRYPT_COST,
            value: config.bcrypt_cost.to_string(),
            reason: e.to_string(),
        })?;
        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
        let credentials = Arc::new(Hs256Credentials::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
            audit.clone(),
        ));

        Ok(Self::new(
            AppRegistry::new(Arc::new(hasher)),
            credentials,
            Arc::new(RoleTable::default()),
            audit,
            Arc::new(StubDirectory::default()),
        ))
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState {
            verifier: self.credentials.clone(),
            roles: self.roles.clone(),
            audit: self.audit.clone(),
        }
    }

    /// Register and mint a credential for the new app.
    ///
    /// The credential is minted only after the record is stored; a signing
    /// failure leaves the app registered and reports an internal error.
    pub async fn register(&self, new_app: NewApp) -> Result<(AppRecord, String), ApiError> {
        let app_id = new_app.app_id().clone();
        let role = new_app.role().clone();

        let record = self
            .registry
            .register(new_app)
            .await
            .map_err(|e| self.failed("register", Some(&app_id), Some(role.as_str()), e))?;

        self.audit.record(
            AuditEvent::new("register", AuditOutcome::Success)
                .app(app_id.as_str())
                .role(role.as_str()),
        );
        tracing::info!(app_id = %app_id, role = %role, "app registered");

        let token = self
            .credentials
            .issue(&record.app_id, record.primary_role(), Utc::now())?;
        Ok((record, token))
    }

    pub async fn create_password(
        &self,
        caller: &Claims,
        app_id: &AppId,
        password: String,
    ) -> Result<(), ApiError> {
        self.registry
            .create_password(app_id, password)
            .await
            .map_err(|e| self.failed("create_password", Some(app_id), Some(caller.role.as_str()), e))?;
        self.succeeded("create_password", caller, Some(app_id));
        Ok(())
    }

    pub async fn update_password(
        &self,
        caller: &Claims,
        app_id: &AppId,
        password: String,
    ) -> Result<(), ApiError> {
        self.registry
            .update_password(app_id, password)
            .await
            .map_err(|e| self.failed("update_password", Some(app_id), Some(caller.role.as_str()), e))?;
        self.succeeded("update_password", caller, Some(app_id));
        Ok(())
    }

    pub fn read_password(&self, caller: &Claims, app_id: &AppId) -> Result<SecretHash, ApiError> {
        let hash = self
            .registry
            .read_password(app_id)
            .map_err(|e| self.failed("read_password", Some(app_id), Some(caller.role.as_str()), e))?;
        self.succeeded("read_password", caller, Some(app_id));
        Ok(hash)
    }

    pub fn list_apps(&self, caller: &Claims) -> Vec<AppRecord> {
        let apps = self.registry.list_apps();
        self.succeeded("list_apps", caller, None);
        apps
    }

    pub async fn import_apps(&self, caller: &Claims) -> Result<ImportSummary, ApiError> {
        let summary = self
            .registry
            .import_from(self.directory.as_ref())
            .await
            .map_err(|e| self.failed("import_apps", None, Some(caller.role.as_str()), e))?;

        self.audit.record(
            AuditEvent::new("import_apps", AuditOutcome::Success)
                .app(caller.app_id.as_str())
                .role(caller.role.as_str())
                .detail(format!(
                    "imported={} skipped={}",
                    summary.imported.len(),
                    summary.skipped.len()
                )),
        );
        Ok(summary)
    }

    fn succeeded(&self, event: &'static str, caller: &Claims, target: Option<&AppId>) {
        let mut entry = AuditEvent::new(event, AuditOutcome::Success)
            .app(target.unwrap_or(&caller.app_id).as_str())
            .role(caller.role.as_str());
        if target.is_some_and(|t| *t != caller.app_id) {
            entry = entry.detail(format!("caller={}", caller.app_id));
        }
        self.audit.record(entry);
    }

    fn failed(
        &self,
        event: &'static str,
        app_id: Option<&AppId>,
        role: Option<&str>,
        err: RegistryError,
    ) -> ApiError {
        let mut entry = AuditEvent::new(event, AuditOutcome::Failure).detail(err.to_string());
        if let Some(app_id) = app_id {
            entry = entry.app(app_id.as_str());
        }
        if let Some(role) = role {
            entry = entry.role(role);
        }
        self.audit.record(entry);
        err.into()
    }
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("registry", &self.registry)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
