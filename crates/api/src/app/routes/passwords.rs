//! The single password slot of an app, addressed by `:appid`.
//!
//! Handlers run behind the route guard, so the caller is already known to
//! hold the permission and, unless admin, to own the target.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
};
use serde_json::json;

use appvault_auth::Claims;
use appvault_core::AppId;
use appvault_registry::record::MSG_INVALID_APP_ID;

use crate::app::dto::PasswordRequest;
use crate::app::errors::{ApiError, Outcome};
use crate::app::services::AppServices;

pub const MSG_PASSWORD_CREATED: &str = "Password created successfully!";
pub const MSG_PASSWORD_UPDATED: &str = "Password updated successfully!";

pub async fn create_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(app_id): Path<String>,
    body: Option<Json<PasswordRequest>>,
) -> Result<Outcome, ApiError> {
    let app_id = parse_app_id(&app_id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let password = body.into_password()?;

    services.create_password(&claims, &app_id, password).await?;
    Ok(Outcome::Created {
        message: MSG_PASSWORD_CREATED,
        token: None,
    })
}

pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(app_id): Path<String>,
    body: Option<Json<PasswordRequest>>,
) -> Result<Outcome, ApiError> {
    let app_id = parse_app_id(&app_id)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let password = body.into_password()?;

    services.update_password(&claims, &app_id, password).await?;
    Ok(Outcome::Ok(json!({ "message": MSG_PASSWORD_UPDATED })))
}

/// Returns the stored hash; the plaintext is never retained.
pub async fn read_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Path(app_id): Path<String>,
) -> Result<Outcome, ApiError> {
    let app_id = parse_app_id(&app_id)?;
    let hash = services.read_password(&claims, &app_id)?;
    Ok(Outcome::Ok(json!({ "password": hash.as_str() })))
}

fn parse_app_id(raw: &str) -> Result<AppId, ApiError> {
    AppId::new(raw).map_err(|_| ApiError::BadRequest(MSG_INVALID_APP_ID.to_string()))
}
