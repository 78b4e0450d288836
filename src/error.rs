//!
//! # Error Handling
//!
//! This module defines the `AppError` type used throughout the application.
//! Every failure a request can hit, from bad credentials and ownership
//! violations to malformed input and storage faults, is represented here
//! and converted into a stable HTTP response shape.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can
//! return `Result<_, AppError>` and have errors rendered as JSON. `From`
//! impls for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, and `bcrypt::BcryptError` let the `?`
//! operator do the conversions.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// All errors surfaced by the application.
///
/// The taxonomy is deliberate: `BadCredentials` carries no detail so a
/// failed login never reveals whether the account exists, and `Forbidden`
/// has the same shape whether the target resource is absent or owned by
/// someone else.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed, mis-signed, or expired bearer token (HTTP 401).
    Unauthenticated(String),
    /// Failed login or password confirmation (HTTP 401). Always rendered
    /// with the same message regardless of the underlying cause.
    BadCredentials,
    /// Duplicate email at registration (HTTP 409).
    Conflict(String),
    /// Mutation of a resource not owned by the caller, or an ownership
    /// mismatch on self-delete (HTTP 403).
    Forbidden(String),
    /// Input validation failure, with field-level detail (HTTP 422).
    Validation(String),
    /// A lookup that cannot fail after successful authentication did fail,
    /// which implies inconsistent server-side data (HTTP 500).
    NotFound(String),
    /// Storage-layer failure (HTTP 500).
    Database(String),
    /// Any other unexpected server-side failure (HTTP 500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::BadCredentials => write!(f, "Bad credentials"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthenticated(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::BadCredentials => HttpResponse::Unauthorized().json(json!({
                "error": "Incorrect login or password"
            })),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::Validation(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "error": msg
            })),
            // NotFound after a successful auth means the caller's account row
            // vanished underneath them; that, like storage and internal
            // faults, is logged in full and returned with a generic body.
            AppError::NotFound(msg) | AppError::Database(msg) | AppError::Internal(msg) => {
                log::error!("unexpected server error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Unexpected server error"
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Unique-constraint violations become `Conflict`; this is what makes the
/// duplicate-email check effectively atomic: the insert and the uniqueness
/// check are the same statement, arbitrated by the database index.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}

/// Every token-processing failure collapses to the same `Unauthenticated`
/// error so a caller cannot learn which verification step rejected it.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthenticated("Invalid or expired token".into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(error.to_string())
    }
}

/// A cancelled `web::block` closure (used for bcrypt work) is a server
/// fault, not a caller mistake.
impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::Internal(error.to_string())
    }
}
