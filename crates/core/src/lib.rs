//! `appvault-core`: shared domain primitives.
//!
//! Pure types only: no HTTP, no storage, no crypto.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::AppId;
