//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: registry, credentials, role table, audit, directory
//! - `routes/`: HTTP handlers, one file per area
//! - `dto.rs`: request bodies and JSON mapping helpers
//! - `errors.rs`: boundary error type and consistent error bodies

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::{ConfigError, ServerConfig};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub fn build_app(config: &ServerConfig) -> Result<Router, ConfigError> {
    let services = Arc::new(AppServices::from_config(config)?);
    Ok(build_app_with(services))
}

/// Build the router around already-wired services.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    let auth = services.auth_state();

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router(&auth))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
