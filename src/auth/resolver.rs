use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, TokenService};
use crate::models::User;
use crate::store::UserStore;

/// The one message every rejected bearer credential gets.
pub const CREDENTIALS_REJECTED: &str = "Could not validate credentials";

/// Turns a bearer token into the user it authenticates.
///
/// Every failure (bad token, expired token, missing subject, subject that is
/// not a user id, user no longer present) collapses into the same
/// `AuthError::Unauthorized`. Store failures are not authentication failures
/// and come back as `AuthError::Internal`.
#[derive(Clone)]
pub struct IdentityResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    pub async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            debug!("bearer token rejected: {}", e);
            rejected()
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            debug!("bearer token subject is not a user id");
            rejected()
        })?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                debug!("bearer token names unknown user {}", user_id);
                Err(rejected())
            }
        }
    }
}

fn rejected() -> AuthError {
    AuthError::Unauthorized(CREDENTIALS_REJECTED.into())
}
