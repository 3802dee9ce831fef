use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::resolver::CREDENTIALS_REJECTED;
use crate::error::AppError;
use crate::models::User;

/// The user resolved from the request's bearer token.
///
/// Intended for routes wrapped in `AuthMiddleware`, which resolves the token
/// and stores the `User` in the request extensions. If nothing is there the
/// request is treated as unauthenticated.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => {
                let err = AppError::Unauthorized(CREDENTIALS_REJECTED.into());
                ready(Err(err.into()))
            }
        }
    }
}
