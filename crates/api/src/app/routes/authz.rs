//! Authorization debugging for operators.
//!
//! Admin-only: the explanation names the failing check, which callers of
//! ordinary routes are never told.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
};

use appvault_auth::{AuthorizationExplanation, Claims, Permission, Role, explain_authorization};
use appvault_core::AppId;
use appvault_registry::record::MSG_INVALID_APP_ID;

use crate::app::dto::{ExplainQuery, MSG_PERMISSION_MANDATORY};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// GET /api/authz/explain?permission=X[&target=Y][&appid=A][&role=R]
///
/// Describes what the guard would decide for the subject `appid`/`role`,
/// which default to the calling admin itself.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ExplainQuery>,
) -> Result<Json<AuthorizationExplanation>, ApiError> {
    let permission = query
        .permission
        .filter(|p| !p.trim().is_empty())
        .map(|p| Permission::new(p.trim().to_string()))
        .ok_or_else(|| ApiError::BadRequest(MSG_PERMISSION_MANDATORY.to_string()))?;

    let target = parse_optional_id(query.target)?;
    let subject = Claims {
        app_id: parse_optional_id(query.appid)?.unwrap_or_else(|| claims.app_id.clone()),
        role: query
            .role
            .map(|r| Role::parse_known(&r).unwrap_or_else(|| Role::from(r.trim().to_string())))
            .unwrap_or_else(|| claims.role.clone()),
        issued_at: claims.issued_at,
        expires_at: claims.expires_at,
    };

    let explanation = explain_authorization(&services.roles, &subject, &permission, target.as_ref());
    tracing::debug!(
        app_id = %claims.app_id,
        subject = %subject.app_id,
        permission = %permission,
        granted = explanation.granted,
        "authorization explained"
    );
    Ok(Json(explanation))
}

fn parse_optional_id(raw: Option<String>) -> Result<Option<AppId>, ApiError> {
    raw.map(AppId::new)
        .transpose()
        .map_err(|_| ApiError::BadRequest(MSG_INVALID_APP_ID.to_string()))
}
