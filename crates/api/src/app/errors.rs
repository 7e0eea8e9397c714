use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};
use thiserror::Error;

use appvault_auth::{AuthnError, AuthzError, TokenError};
use appvault_core::DomainError;
use appvault_registry::RegistryError;

pub const MSG_NO_TOKEN: &str = "Access denied. No token provided.";
pub const MSG_INVALID_TOKEN: &str = "Invalid token.";
pub const MSG_ACCESS_DENIED: &str = "Access denied.";
pub const MSG_INTERNAL: &str = "Internal server error.";

/// Boundary error. Every failure below the HTTP layer ends up here and is
/// rendered as `{"error": <code>, "message": <text>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthnError),

    #[error("forbidden: {0}")]
    Forbidden(AuthzError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Detail goes to the log only.
    #[error("internal: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            // Authentication failures are 403 like authorization ones; an
            // expired credential reads the same as a forged one.
            ApiError::Unauthenticated(AuthnError::MissingCredential) => {
                json_error(StatusCode::FORBIDDEN, "forbidden", MSG_NO_TOKEN)
            }
            ApiError::Unauthenticated(_) => {
                json_error(StatusCode::FORBIDDEN, "forbidden", MSG_INVALID_TOKEN)
            }
            ApiError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", MSG_ACCESS_DENIED),
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", MSG_INTERNAL)
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Domain(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Successful outcome of a registry operation.
#[derive(Debug)]
pub enum Outcome {
    /// 201. `token` is present only for registrations.
    Created {
        message: &'static str,
        token: Option<String>,
    },
    /// 200 with a JSON payload.
    Ok(Value),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> axum::response::Response {
        match self {
            Outcome::Created {
                message,
                token: Some(token),
            } => (
                StatusCode::CREATED,
                axum::Json(json!({ "message": message, "token": token })),
            )
                .into_response(),
            Outcome::Created { message, token: None } => {
                (StatusCode::CREATED, axum::Json(json!({ "message": message }))).into_response()
            }
            Outcome::Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
