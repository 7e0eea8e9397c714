use axum::{
    Router,
    routing::{get, post, put},
};

use appvault_auth::permissions;

use crate::middleware::{AuthState, authenticated, guarded};

pub mod apps;
pub mod authz;
pub mod passwords;
pub mod system;

/// Router for everything under `/api`.
///
/// Each protected method carries its own guard; methods sharing a path are
/// merged so every verb keeps its own permission.
pub fn router(auth: &AuthState) -> Router {
    let password = guarded(auth, permissions::CREATE_PASSWORD, post(passwords::create_password))
        .merge(guarded(auth, permissions::UPDATE_OWN_PASSWORD, put(passwords::update_password)))
        .merge(guarded(auth, permissions::READ_OWN_PASSWORD, get(passwords::read_password)));

    Router::new()
        .route("/app", post(apps::register))
        .route("/app/password/:appid", password)
        .route("/apps", guarded(auth, permissions::READ_APPS, get(apps::list_apps)))
        .route("/import/apps", guarded(auth, permissions::UPDATE_APPS, post(apps::import_apps)))
        .route("/authz/explain", guarded(auth, permissions::READ_APPS, get(authz::explain)))
        .route("/whoami", authenticated(auth, get(system::whoami)))
}
