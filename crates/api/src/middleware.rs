use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request, State},
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::MethodRouter,
};

use appvault_auth::{CredentialVerifier, Permission, RoleTable};
use appvault_observability::AuditSink;

use crate::app::errors::ApiError;
use crate::authz::authorize_request;
use crate::context::RequestContext;

/// Path parameter naming the app a targeted route acts on.
pub const TARGET_PARAM: &str = "appid";

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn CredentialVerifier>,
    pub roles: Arc<RoleTable>,
    pub audit: Arc<dyn AuditSink>,
}

/// Per-route guard: the shared auth state plus the route's permission.
/// `None` means "any valid credential".
#[derive(Clone)]
pub struct Guard {
    auth: AuthState,
    permission: Option<Permission>,
}

pub async fn guard_middleware(
    State(guard): State<Guard>,
    params: Option<RawPathParams>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let target = params.and_then(|params| {
        params
            .iter()
            .find(|(name, _)| *name == TARGET_PARAM)
            .map(|(_, value)| value.to_string())
    });
    let ctx = RequestContext::from_headers(req.headers(), target);

    let claims = authorize_request(&guard.auth, &ctx, guard.permission.as_ref())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Require `permission` on this route. The `appid` path parameter, when the
/// route has one, is the ownership target.
pub fn guarded<S>(auth: &AuthState, permission: Permission, route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    with_guard(auth, Some(permission), route)
}

/// Require only a valid credential.
pub fn authenticated<S>(auth: &AuthState, route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    with_guard(auth, None, route)
}

fn with_guard<S>(auth: &AuthState, permission: Option<Permission>, route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let guard = Guard {
        auth: auth.clone(),
        permission,
    };
    route.route_layer(from_fn_with_state(guard, guard_middleware))
}
