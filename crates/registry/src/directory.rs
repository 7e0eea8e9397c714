//! External app directory and bulk import.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use appvault_core::AppId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("external directory unavailable: {0}")]
    Unavailable(String),
}

/// One entry as published by the external directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalApp {
    pub app_id: String,
    pub name: String,
}

impl ExternalApp {
    pub fn new(app_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: name.into(),
        }
    }
}

/// Source of app records for bulk import.
#[async_trait]
pub trait ExternalDirectory: Send + Sync {
    async fn fetch_external_apps(&self) -> Result<Vec<ExternalApp>, DirectoryError>;
}

/// Fixed in-process directory used until a real upstream exists.
#[derive(Debug, Clone)]
pub struct StubDirectory {
    apps: Vec<ExternalApp>,
}

impl StubDirectory {
    pub fn new(apps: Vec<ExternalApp>) -> Self {
        Self { apps }
    }
}

impl Default for StubDirectory {
    fn default() -> Self {
        Self::new(vec![
            ExternalApp::new("ext-billing", "Billing Service"),
            ExternalApp::new("ext-reporting", "Reporting Service"),
            ExternalApp::new("ext-notifications", "Notification Service"),
        ])
    }
}

#[async_trait]
impl ExternalDirectory for StubDirectory {
    async fn fetch_external_apps(&self) -> Result<Vec<ExternalApp>, DirectoryError> {
        Ok(self.apps.clone())
    }
}

/// Result of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Newly created, in directory order.
    pub imported: Vec<AppId>,
    /// Already registered (or repeated within the batch); left untouched.
    pub skipped: Vec<AppId>,
    /// Entries with an unusable id or a blank name.
    pub rejected: usize,
}
