use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use appvault_auth::Role;
use appvault_core::{AppId, DomainError};

use crate::directory::{ExternalDirectory, ImportSummary};
use crate::record::{AppRecord, NewApp, SecretHash};
use crate::{PasswordHasher, RegistryError};

pub const MSG_APP_EXISTS: &str = "App already registered.";
pub const MSG_APP_NOT_FOUND: &str = "App not found.";
pub const MSG_PASSWORD_EXISTS: &str = "Password for this app already exists.";
pub const MSG_PASSWORD_NOT_FOUND: &str = "Password for this app not found.";

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<AppId, AppRecord>,
    /// Registration order, for listing.
    order: Vec<AppId>,
}

impl Inner {
    fn insert(&mut self, record: AppRecord) {
        self.order.push(record.app_id.clone());
        self.records.insert(record.app_id.clone(), record);
    }
}

/// In-memory app registry.
///
/// One `RwLock` guards every record. Mutations re-check their preconditions
/// under the write lock, so a check-then-insert (or check-then-set) is atomic
/// with respect to every other mutation; readers always see whole records.
/// The lock is never held across an `.await`.
pub struct AppRegistry {
    inner: RwLock<Inner>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AppRegistry {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            hasher,
        }
    }

    pub fn hasher(&self) -> &Arc<dyn PasswordHasher> {
        &self.hasher
    }

    /// Register a new app.
    ///
    /// Fails with `Conflict` if the id is taken. Nothing is written on any
    /// failure path.
    pub async fn register(&self, new: NewApp) -> Result<AppRecord, RegistryError> {
        // Cheap early reject; authoritative check happens under the write lock.
        if self.read().records.contains_key(&new.app_id) {
            return Err(DomainError::conflict(MSG_APP_EXISTS).into());
        }

        let NewApp {
            app_id,
            name,
            secret,
            role,
            password,
        } = new;

        let hasher = self.hasher.clone();
        let (secret_hash, password_hash) = run_blocking(move || {
            let secret_hash = hasher.hash(&secret)?;
            let password_hash = password.map(|p| hasher.hash(&p)).transpose()?;
            Ok((secret_hash, password_hash))
        })
        .await?;

        let record = AppRecord {
            app_id,
            name,
            secret_hash: Some(SecretHash::new(secret_hash)),
            roles: vec![role],
            password_hash: password_hash.map(SecretHash::new),
            registered_at: Utc::now(),
        };

        let mut inner = self.write();
        if inner.records.contains_key(&record.app_id) {
            return Err(DomainError::conflict(MSG_APP_EXISTS).into());
        }
        inner.insert(record.clone());

        tracing::debug!(app_id = %record.app_id, role = %record.primary_role(), "app registered");
        Ok(record)
    }

    /// Create the app's password. Not an upsert.
    pub async fn create_password(&self, app_id: &AppId, password: String) -> Result<(), RegistryError> {
        ensure_can_create(&self.read(), app_id)?;

        let hash = self.hash(password).await?;

        let mut inner = self.write();
        ensure_can_create(&inner, app_id)?;
        if let Some(record) = inner.records.get_mut(app_id) {
            record.password_hash = Some(hash);
        }

        tracing::debug!(app_id = %app_id, "password created");
        Ok(())
    }

    /// Overwrite an existing password. No history is kept.
    pub async fn update_password(&self, app_id: &AppId, password: String) -> Result<(), RegistryError> {
        ensure_has_password(&self.read(), app_id)?;

        let hash = self.hash(password).await?;

        let mut inner = self.write();
        ensure_has_password(&inner, app_id)?;
        if let Some(record) = inner.records.get_mut(app_id) {
            record.password_hash = Some(hash);
        }

        tracing::debug!(app_id = %app_id, "password updated");
        Ok(())
    }

    /// The stored password hash, verbatim.
    pub fn read_password(&self, app_id: &AppId) -> Result<SecretHash, RegistryError> {
        let inner = self.read();
        ensure_has_password(&inner, app_id)?;
        inner
            .records
            .get(app_id)
            .and_then(|r| r.password_hash.clone())
            .ok_or_else(|| DomainError::not_found(MSG_PASSWORD_NOT_FOUND).into())
    }

    /// All apps in registration order.
    pub fn list_apps(&self) -> Vec<AppRecord> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    pub fn get(&self, app_id: &AppId) -> Option<AppRecord> {
        self.read().records.get(app_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pull apps from `directory` and add the ones not yet registered.
    ///
    /// Idempotent: existing ids are skipped, never overwritten. Imported apps
    /// get the `client` role and neither secret nor password. The whole batch
    /// is applied under one write lock.
    pub async fn import_from(
        &self,
        directory: &dyn ExternalDirectory,
    ) -> Result<ImportSummary, RegistryError> {
        let external = directory.fetch_external_apps().await?;

        let mut summary = ImportSummary::default();
        let now = Utc::now();
        let mut inner = self.write();

        for entry in external {
            let Ok(app_id) = AppId::new(&entry.app_id) else {
                summary.rejected += 1;
                continue;
            };
            let name = entry.name.trim();
            if name.is_empty() {
                summary.rejected += 1;
                continue;
            }
            if inner.records.contains_key(&app_id) {
                summary.skipped.push(app_id);
                continue;
            }

            inner.insert(AppRecord {
                app_id: app_id.clone(),
                name: name.to_string(),
                secret_hash: None,
                roles: vec![Role::Client],
                password_hash: None,
                registered_at: now,
            });
            summary.imported.push(app_id);
        }

        tracing::debug!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            rejected = summary.rejected,
            "external apps imported"
        );
        Ok(summary)
    }

    async fn hash(&self, plain: String) -> Result<SecretHash, RegistryError> {
        let hasher = self.hasher.clone();
        let hash = run_blocking(move || Ok(hasher.hash(&plain)?)).await?;
        Ok(SecretHash::new(hash))
    }

    // A panic while holding the lock cannot leave a half-written record (every
    // write is a single insert/assignment), so poisoning is recovered from.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl core::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppRegistry")
            .field("apps", &self.len())
            .finish_non_exhaustive()
    }
}

fn ensure_can_create(inner: &Inner, app_id: &AppId) -> Result<(), DomainError> {
    match inner.records.get(app_id) {
        None => Err(DomainError::not_found(MSG_APP_NOT_FOUND)),
        Some(r) if r.has_password() => Err(DomainError::conflict(MSG_PASSWORD_EXISTS)),
        Some(_) => Ok(()),
    }
}

fn ensure_has_password(inner: &Inner, app_id: &AppId) -> Result<(), DomainError> {
    match inner.records.get(app_id) {
        None => Err(DomainError::not_found(MSG_APP_NOT_FOUND)),
        Some(r) if !r.has_password() => Err(DomainError::not_found(MSG_PASSWORD_NOT_FOUND)),
        Some(_) => Ok(()),
    }
}

/// Run blocking hash work on tokio's blocking pool. The closure takes
/// ownership of any plaintext, which is dropped when it returns.
async fn run_blocking<T, F>(f: F) -> Result<T, RegistryError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RegistryError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RegistryError::Worker(e.to_string()))?
}
