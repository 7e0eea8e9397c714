use std::sync::Arc;

use axum::{Json, extract::Extension};
use serde_json::json;

use appvault_auth::Claims;

use crate::app::dto::{self, RegisterRequest};
use crate::app::errors::{ApiError, Outcome};
use crate::app::services::AppServices;

pub const MSG_REGISTERED: &str = "App registered with success!";

/// POST /api/app - open registration; answers with the new app's credential.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Option<Json<RegisterRequest>>,
) -> Result<Outcome, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let new_app = body.into_new_app()?;

    let (_record, token) = services.register(new_app).await?;
    Ok(Outcome::Created {
        message: MSG_REGISTERED,
        token: Some(token),
    })
}

/// GET /api/apps
pub async fn list_apps(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
) -> Outcome {
    let apps: Vec<_> = services.list_apps(&claims).iter().map(dto::app_to_json).collect();
    Outcome::Ok(json!({ "apps": apps }))
}

/// POST /api/import/apps - pull from the external directory; safe to repeat.
pub async fn import_apps(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
) -> Result<Outcome, ApiError> {
    let summary = services.import_apps(&claims).await?;
    Ok(Outcome::Ok(dto::import_summary_to_json(&summary)))
}
