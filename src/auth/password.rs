use argon2::password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use log::warn;

use crate::auth::AuthError;

/// Longest password accepted for hashing, in bytes. Bounds the work an
/// attacker can force per request.
pub const MAX_PASSWORD_BYTES: usize = 1024;

/// Argon2id password hashing with a random salt per hash.
///
/// Hashes are PHC strings that embed their own parameters, so changing the
/// cost settings does not invalidate existing credentials.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation("password is too long".into()));
        }

        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored hash.
    ///
    /// A mismatch, an out-of-range password or a hash produced with an
    /// algorithm this hasher does not speak yields `Ok(false)`. A stored value
    /// that is not a PHC string at all means the record is corrupted and is
    /// reported as `AuthError::Internal`.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        if password.is_empty() || password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::Internal(format!("Stored credential is corrupted: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => {
                warn!("password verification rejected stored hash: {}", e);
                Ok(false)
            }
        }
    }
}
