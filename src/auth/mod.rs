//! Password authentication and bearer tokens.
//!
//! `CredentialHasher` and `TokenService` are the leaves; `AuthService`
//! orchestrates registration and login on top of a `UserStore`;
//! `IdentityResolver` turns an incoming bearer token back into a `User`.
//! `AuthMiddleware` and `AuthenticatedUser` wire the resolver into actix-web.

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::User;

pub use error::{AuthError, TokenError};
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::CredentialHasher;
pub use resolver::IdentityResolver;
pub use service::AuthService;
pub use token::{Claims, TokenService};

/// Username and password, as posted to both `/auth/register` and `/auth/login`.
///
/// The validation rules apply to registration only; login accepts whatever it
/// is given and simply fails to match.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    /// Unique, case-sensitive, 3 to 50 characters.
    #[validate(length(min = 3, max = 50, message = "username must be 3 to 50 characters"))]
    pub username: String,
    /// 6 to 128 characters.
    #[validate(length(min = 6, max = 128, message = "password must be 6 to 128 characters"))]
    pub password: String,
}

/// Returned by a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    pub user_id: Uuid,
    pub username: String,
}

impl TokenBundle {
    pub fn bearer(access_token: String, user: &User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}
