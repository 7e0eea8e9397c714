//! One-way salted hashing of secrets and passwords.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("bcrypt cost {0} outside 4..=31")]
    InvalidCost(u32),

    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// Slow adaptive hash with a fresh random salt per call.
///
/// Implementations are blocking; callers run them off the async executor.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    /// Whether `plain` matches `hash`. Malformed hashes never match.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

/// bcrypt with a configurable cost factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub const DEFAULT_COST: u32 = 10;
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plain, self.cost)?)
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or(false)
    }
}
