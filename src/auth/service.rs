use log::{info, warn};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task;
use validator::Validate;

use crate::auth::{
    AuthError, Claims, CredentialHasher, Credentials, IdentityResolver, TokenBundle, TokenError,
    TokenService,
};
use crate::clock::Clock;
use crate::config::{AuthConfig, ConfigError};
use crate::models::User;
use crate::store::UserStore;

/// Password checked on logins for unknown usernames.
const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Registration, login and token checks on top of a user store.
///
/// Holds no mutable state of its own; one instance is shared by all request
/// workers.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    tokens: Arc<TokenService>,
    resolver: IdentityResolver,
    /// Hashed with the configured cost on first use, so a login for an unknown
    /// username costs the same as a wrong password.
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let hasher = CredentialHasher::new(config.argon2_params()?);
        let tokens = Arc::new(TokenService::new(config, clock));
        Ok(Self::from_parts(users, hasher, tokens))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        hasher: CredentialHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        let resolver = IdentityResolver::new(Arc::clone(&tokens), Arc::clone(&users));
        Self {
            users,
            hasher,
            tokens,
            resolver,
            decoy_hash: OnceCell::new(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates a user after validating the input and hashing the password.
    ///
    /// The up-front username lookup only gives a cheap early answer; the
    /// store's uniqueness constraint is what actually decides a race, and its
    /// violation is reported as `DuplicateUser` too.
    pub async fn register(&self, credentials: &Credentials) -> Result<User, AuthError> {
        credentials
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        if self
            .users
            .find_by_username(&credentials.username)
            .await?
            .is_some()
        {
            warn!("registration rejected: username already taken");
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hash_password(&credentials.password).await?;
        let user = User::new(credentials.username.as_str(), password_hash);
        self.users.insert(&user).await?;

        info!("registered user {}", user.id);
        Ok(user)
    }

    /// Checks the credentials and issues an access token.
    ///
    /// Unknown usernames and wrong passwords both end in `InvalidCredentials`.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenBundle, AuthError> {
        let user = match self.users.find_by_username(&credentials.username).await? {
            Some(user) => user,
            None => {
                let decoy = self
                    .decoy_hash
                    .get_or_try_init(|| self.hash_password(DECOY_PASSWORD))
                    .await?;
                self.verify_password(&credentials.password, decoy).await?;
                warn!("login failed: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .verify_password(&credentials.password, &user.password_hash)
            .await?
        {
            warn!("login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_default(user.id)?;
        info!("user {} logged in", user.id);
        Ok(TokenBundle::bearer(access_token, &user))
    }

    /// Verifies a token string without looking the user up.
    ///
    /// Expired tokens get their own message; every other defect reads as an
    /// invalid token.
    pub fn verify_token_string(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::Unauthorized("Token has expired".into()),
            TokenError::Malformed | TokenError::MissingSubject => {
                AuthError::Unauthorized("Invalid token".into())
            }
        })
    }

    /// Resolves a bearer token to the user it authenticates.
    pub async fn resolve_identity(&self, token: &str) -> Result<User, AuthError> {
        self.resolver.resolve(token).await
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?
    }
}
