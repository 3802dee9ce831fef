use std::fmt;

use crate::store::StoreError;

/// Outcome kinds of the authentication core.
///
/// These are transport-agnostic; `crate::error::AppError` maps them onto
/// HTTP status codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Input failed a constraint such as minimum password length.
    Validation(String),
    /// The username is already registered.
    DuplicateUser,
    /// Unknown username or wrong password. The two are never distinguished.
    InvalidCredentials,
    /// Token missing, malformed, expired, without subject, or naming a user
    /// that no longer exists.
    Unauthorized(String),
    /// Store or hashing failure unrelated to the caller's credentials.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::Validation(msg) => write!(f, "validation failed: {}", msg),
            AuthError::DuplicateUser => write!(f, "username already registered"),
            AuthError::InvalidCredentials => write!(f, "invalid credentials"),
            AuthError::Unauthorized(msg) => write!(f, "unauthorized: {}", msg),
            AuthError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Store failures surface as internal errors, except a uniqueness violation
/// which can only mean the username was taken concurrently.
impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> AuthError {
        match error {
            StoreError::DuplicateKey(_) => AuthError::DuplicateUser,
            StoreError::Backend(msg) => AuthError::Internal(msg),
        }
    }
}

/// Why a bearer token was rejected. Never shown to clients as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Unparseable, wrong algorithm, or bad signature.
    Malformed,
    Expired,
    MissingSubject,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "malformed token"),
            TokenError::Expired => write!(f, "token expired"),
            TokenError::MissingSubject => write!(f, "token has no subject"),
        }
    }
}

impl std::error::Error for TokenError {}
