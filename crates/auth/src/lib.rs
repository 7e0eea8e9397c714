//! `appvault-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies
//! credentials into [`Claims`] and decides whether those claims may exercise a
//! [`Permission`] on a target app.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod roles;
pub mod table;
pub mod token;

pub use authorize::{
    AuthorizationExplanation, AuthzError, DenialKind, DenialReason, authorize, explain_authorization,
};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use permissions::{Permission, PermissionSet};
pub use roles::Role;
pub use table::RoleTable;
pub use token::{AuthnError, CredentialIssuer, CredentialVerifier, Hs256Credentials, TokenError};
