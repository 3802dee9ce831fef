use crate::{
    auth::{AuthService, AuthenticatedUser, Credentials},
    error::AppError,
    models::UserResponse,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

/// Register a new user
///
/// ## Responses:
/// - `201 Created`: `{id, username}` of the new account.
/// - `400 Bad Request`: malformed body, a username outside 3 to 50 characters,
///   a password outside 6 to 128 characters, or a username already taken.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let user = auth.register(&credentials).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Login user
///
/// ## Responses:
/// - `200 OK`: `{access_token, token_type, user_id, username}`.
/// - `401 Unauthorized`: unknown username or wrong password, indistinguishably.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    credentials: web::Json<Credentials>,
) -> Result<impl Responder, AppError> {
    let bundle = auth.login(&credentials).await?;
    Ok(HttpResponse::Ok().json(bundle))
}

/// Current user
///
/// Mounted behind `AuthMiddleware`.
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(UserResponse::from(&user.0))
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenParam {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenVerification {
    pub valid: bool,
    pub user_id: String,
    /// Unix seconds.
    pub expires: i64,
}

/// Verify a token
///
/// The token is read from the `token` query parameter, falling back to a JSON
/// body `{"token": "..."}`. Only signature, expiry and subject are checked;
/// the user is not looked up.
///
/// ## Responses:
/// - `200 OK`: `{valid: true, user_id, expires}`.
/// - `400 Bad Request`: no token supplied.
/// - `401 Unauthorized`: the token is invalid or expired.
#[post("/verify-token")]
pub async fn verify_token(
    auth: web::Data<AuthService>,
    query: web::Query<TokenParam>,
    body: Option<web::Json<TokenParam>>,
) -> Result<impl Responder, AppError> {
    let token = query
        .into_inner()
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().token))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("token is required".into()))?;

    let claims = auth.verify_token_string(&token)?;
    Ok(HttpResponse::Ok().json(TokenVerification {
        valid: true,
        user_id: claims.sub,
        expires: claims.exp,
    }))
}
