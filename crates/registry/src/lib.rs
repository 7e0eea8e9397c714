//! `appvault-registry`: in-memory app/secret store.
//!
//! Owns every [`AppRecord`]. Hashing is pushed onto tokio's blocking pool so a
//! slow hash never stalls unrelated requests; all check-then-write sequences
//! run under a single write lock.

pub mod directory;
pub mod error;
pub mod hasher;
pub mod record;
pub mod store;

pub use directory::{DirectoryError, ExternalApp, ExternalDirectory, ImportSummary, StubDirectory};
pub use error::RegistryError;
pub use hasher::{BcryptHasher, HashError, PasswordHasher};
pub use record::{AppRecord, NewApp, SecretHash};
pub use store::AppRegistry;
