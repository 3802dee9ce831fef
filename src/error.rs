//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used at the HTTP boundary.
//! The authentication core and the stores return their own error kinds
//! (`AuthError`, `StoreError`); this is the one place where those kinds are
//! translated into status codes and JSON bodies.
//!
//! `AppError` implements `actix_web::error::ResponseError`, and provides `From`
//! implementations for the core error types and `validator::ValidationErrors`,
//! so handlers can use the `?` operator throughout.

use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Represents all possible errors that can be returned to a client.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    /// The response carries a `WWW-Authenticate: Bearer` challenge.
    Unauthorized(String),
    /// Malformed or rejected request, including duplicate usernames (HTTP 400).
    BadRequest(String),
    /// Requested resource does not exist for this caller (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from the persistence layer (HTTP 500).
    DatabaseError(String),
    /// Input failed field validation (HTTP 400).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "error": msg })),
            AppError::BadRequest(msg) | AppError::ValidationError(msg) => {
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            }
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({ "error": msg })),
            // Internal details go to the log, never to the client.
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                error!("request failed: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

/// Maps the authentication core's error kinds onto HTTP semantics.
///
/// `InvalidCredentials` always renders the same message so that an unknown
/// username and a wrong password cannot be told apart.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::DuplicateUser => AppError::BadRequest("Username already registered".into()),
            AuthError::InvalidCredentials => {
                AppError::Unauthorized("Invalid username or password".into())
            }
            AuthError::Unauthorized(msg) => AppError::Unauthorized(msg),
            AuthError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::DuplicateKey(msg) => AppError::BadRequest(msg),
            StoreError::Backend(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
