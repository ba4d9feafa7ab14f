//! Argon2id password hashing.
//!
//! Each hash gets a fresh random salt and is stored as a PHC string, so the
//! parameters travel with the hash and verification needs no extra state.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use super::error::AuthError;

/// Hashes and verifies passwords with fixed Argon2id parameters.
#[derive(Clone, Debug)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Hasher using the crate's default (production) cost parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Hasher with explicit cost parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a newly generated salt.
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` if the hash cannot be computed.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    /// Check a password against a stored PHC string.
    ///
    /// # Errors
    /// Returns `AuthError::Hashing` if the stored hash cannot be parsed.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed =
            PasswordHash::new(stored_hash).map_err(|err| AuthError::Hashing(err.to_string()))?;
        // Parameters are read back from the PHC string, not from `self`.
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}
