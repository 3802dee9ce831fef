use std::env;
use std::fmt;
use std::str::FromStr;

use argon2::Params;
use jsonwebtoken::Algorithm;

/// Error raised while reading configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {}: {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One year.
const MAX_EXPIRE_MINUTES: i64 = 60 * 24 * 365;

/// Process-wide settings for token signing and password hashing.
///
/// Built once at startup and shared read-only with the token service and the
/// credential hasher.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl AuthConfig {
    pub const DEFAULT_EXPIRE_MINUTES: i64 = 30;

    /// Settings with the given secret and every other value at its default.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: Algorithm::HS256,
            access_token_expire_minutes: Self::DEFAULT_EXPIRE_MINUTES,
            hash_memory_kib: Params::DEFAULT_M_COST,
            hash_iterations: Params::DEFAULT_T_COST,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = env::var("SECRET_KEY").map_err(|_| ConfigError::Missing("SECRET_KEY"))?;
        if secret_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "SECRET_KEY",
                value: String::new(),
            });
        }

        let algorithm = match env::var("ALGORITHM") {
            Ok(value) => parse_algorithm(&value)?,
            Err(_) => Algorithm::HS256,
        };

        let access_token_expire_minutes: i64 =
            parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", Self::DEFAULT_EXPIRE_MINUTES)?;
        if !(1..=MAX_EXPIRE_MINUTES).contains(&access_token_expire_minutes) {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: access_token_expire_minutes.to_string(),
            });
        }

        let config = Self {
            secret_key,
            algorithm,
            access_token_expire_minutes,
            hash_memory_kib: parse_var("ARGON2_MEMORY_KIB", Params::DEFAULT_M_COST)?,
            hash_iterations: parse_var("ARGON2_ITERATIONS", Params::DEFAULT_T_COST)?,
        };
        config.argon2_params()?;
        Ok(config)
    }

    /// Argon2 cost parameters derived from this configuration.
    pub fn argon2_params(&self) -> Result<Params, ConfigError> {
        Params::new(
            self.hash_memory_kib,
            self.hash_iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| ConfigError::Invalid {
            key: "ARGON2_MEMORY_KIB/ARGON2_ITERATIONS",
            value: e.to_string(),
        })
    }
}

pub struct Config {
    /// When unset the server runs against in-memory stores.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            auth: AuthConfig::from_env()?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Only the HMAC family is usable with a shared secret.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key: "ALGORITHM",
        value: value.to_string(),
    };
    match Algorithm::from_str(value.trim()).map_err(|_| invalid())? {
        alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => Ok(alg),
        _ => Err(invalid()),
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::Invalid { key, value })
        }
        Err(_) => Ok(default),
    }
}
