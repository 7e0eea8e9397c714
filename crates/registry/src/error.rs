use thiserror::Error;

use appvault_core::DomainError;

use crate::{DirectoryError, HashError};

/// Registry failure.
///
/// [`RegistryError::Domain`] carries the caller-facing cases; everything else
/// is internal and must be reported to callers generically.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("hashing failed: {0}")]
    Hash(#[from] HashError),

    #[error("hashing worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
