use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, TokenError};
use crate::clock::Clock;
use crate::config::AuthConfig;

/// Represents the claims encoded within a JWT.
///
/// Only the subject and the absolute expiry are carried.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// The user's identifier.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Wire shape accepted on decode, where the subject may be absent.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    exp: i64,
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Stateless: nothing about issued tokens is kept. Changing the secret
/// invalidates every token issued under the old one.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm: config.algorithm,
            default_ttl: Duration::minutes(config.access_token_expire_minutes),
            clock,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Issues a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: (self.clock.now() + ttl).timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Issues a token with the configured default lifetime.
    pub fn issue_default(&self, subject: Uuid) -> Result<String, AuthError> {
        self.issue(subject, self.default_ttl)
    }

    /// Checks signature, then expiry against the injected clock, then subject.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is judged against our clock below, not the library's.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let raw = decode::<RawClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Malformed)?
            .claims;

        if self.clock.now().timestamp() >= raw.exp {
            return Err(TokenError::Expired);
        }

        match raw.sub {
            Some(sub) if !sub.trim().is_empty() => Ok(Claims { sub, exp: raw.exp }),
            _ => Err(TokenError::MissingSubject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::Utc;
    use serde_json::json;

    const SECRET: &str = "test_secret_for_tokens";

    fn service_with_clock() -> (TokenService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = TokenService::new(&AuthConfig::with_secret(SECRET), clock.clone());
        (service, clock)
    }

    fn sign(payload: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_token_generation_and_verification() {
        let (service, clock) = service_with_clock();
        let user_id = Uuid::new_v4();

        let token = service.issue_default(user_id).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp, (clock.now() + Duration::minutes(30)).timestamp());
    }

    #[test]
    fn test_token_expiration() {
        let (service, clock) = service_with_clock();
        let token = service.issue(Uuid::new_v4(), Duration::minutes(5)).unwrap();

        clock.advance(Duration::minutes(4));
        assert!(service.verify(&token).is_ok());

        clock.advance(Duration::minutes(2));
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_with_past_expiry() {
        let (service, clock) = service_with_clock();
        let token = sign(json!({
            "sub": Uuid::new_v4().to_string(),
            "exp": (clock.now() - Duration::hours(2)).timestamp(),
        }));
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let (service, _) = service_with_clock();
        let other = TokenService::new(
            &AuthConfig::with_secret("a_completely_different_secret"),
            Arc::new(FixedClock::new(Utc::now())),
        );
        let token = other.issue_default(Uuid::new_v4()).unwrap();

        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let (service, _) = service_with_clock();
        for token in [
            "",
            "not.a.token",
            "invalid_token_format",
            "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature",
        ] {
            assert_eq!(service.verify(token), Err(TokenError::Malformed), "{:?}", token);
        }
    }

    #[test]
    fn test_algorithm_mismatch_is_malformed() {
        let (service, clock) = service_with_clock();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &Claims {
                sub: Uuid::new_v4().to_string(),
                exp: (clock.now() + Duration::minutes(5)).timestamp(),
            },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_missing_expiry_is_malformed() {
        let (service, _) = service_with_clock();
        let token = sign(json!({ "sub": Uuid::new_v4().to_string() }));
        assert_eq!(service.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_missing_or_empty_subject() {
        let (service, clock) = service_with_clock();
        let exp = (clock.now() + Duration::minutes(5)).timestamp();

        let no_sub = sign(json!({ "exp": exp }));
        assert_eq!(service.verify(&no_sub), Err(TokenError::MissingSubject));

        let empty_sub = sign(json!({ "sub": "", "exp": exp }));
        assert_eq!(service.verify(&empty_sub), Err(TokenError::MissingSubject));
    }
}
