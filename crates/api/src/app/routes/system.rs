use std::sync::Arc;

use axum::{Json, extract::Extension};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use appvault_auth::Claims;

use crate::app::services::AppServices;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "UP",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// GET /api/whoami - the verified identity behind the presented credential.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
) -> Json<Value> {
    let permissions: Vec<_> = services
        .roles
        .permissions_for(&claims.role)
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();

    Json(json!({
        "appid": claims.app_id.as_str(),
        "role": claims.role.as_str(),
        "permissions": permissions,
        "expires_at": claims.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
