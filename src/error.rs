// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Application error types with consistent API responses.
//!
//! Every failure leaves the process through the same JSON envelope:
//! `{ "success": false, "message": ..., "error": { "code": ..., "details"? } }`.
//! The `code` values are part of the client contract — the frontend's
//! silent-refresh logic keys off `TOKEN_EXPIRED` and `SESSION_EXPIRED`.

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller input failed validation (the string carries the specifics).
    #[error("Validation failed")]
    Validation(String),

    #[error("An account with this email already exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    /// Verification or reset code is absent, expired, or does not match.
    /// Deliberately covers all three cases with one answer.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Malformed or badly signed credential presented to the request gate.
    #[error("Invalid authentication token")]
    InvalidAuthToken,

    /// Well-formed credential past its expiration.
    #[error("Access token has expired")]
    TokenExpired,

    /// Session cookie verified but no live session marker exists.
    #[error("Session has expired")]
    SessionExpired,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Email address is not verified")]
    EmailNotVerified,

    /// Login failure. Identical for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address is already verified")]
    AlreadyVerified,

    /// Email delivery failure surfaced to the caller (forgot-password).
    #[error("Failed to send email")]
    Email(String),

    /// Email delivery failure during an explicit resend.
    #[error("Failed to resend verification email")]
    Resend(String),

    /// Unexpected failure while persisting a new registration.
    #[error("Registration failed")]
    Registration(String),

    /// Unexpected failure while saving the onboarding profile.
    #[error("Failed to complete onboarding")]
    Onboarding(String),

    /// Unexpected failure inside the request gate.
    #[error("Authentication check failed")]
    Auth(String),

    #[error("Database error")]
    Database(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UserExists => "USER_EXISTS",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::InvalidToken | AppError::InvalidAuthToken => "INVALID_TOKEN",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::SessionExpired => "SESSION_EXPIRED",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::AlreadyVerified => "ALREADY_VERIFIED",
            AppError::Email(_) => "EMAIL_ERROR",
            AppError::Resend(_) => "RESEND_ERROR",
            AppError::Registration(_) => "REGISTRATION_ERROR",
            AppError::Onboarding(_) => "ONBOARDING_FAILED",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for the response.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidToken | AppError::AlreadyVerified => {
                StatusCode::BAD_REQUEST
            }
            AppError::UserExists => StatusCode::CONFLICT,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidAuthToken
            | AppError::TokenExpired
            | AppError::SessionExpired
            | AppError::Unauthorized
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::EmailNotVerified => StatusCode::FORBIDDEN,
            AppError::Email(_)
            | AppError::Resend(_)
            | AppError::Registration(_)
            | AppError::Onboarding(_)
            | AppError::Auth(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON failure envelope body.
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    message: String,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Internal causes are logged here and never forwarded to the client.
        match &self {
            AppError::Email(cause)
            | AppError::Resend(cause)
            | AppError::Registration(cause)
            | AppError::Onboarding(cause)
            | AppError::Auth(cause)
            | AppError::Database(cause) => {
                tracing::error!(code = self.code(), error = %cause, "Request failed");
            }
            AppError::Internal(err) => {
                tracing::error!(code = self.code(), error = %err, "Internal server error");
            }
            _ => {}
        }

        let details = match &self {
            AppError::Validation(details) => Some(details.clone()),
            _ => None,
        };

        let body = ErrorEnvelope {
            success: false,
            message: self.to_string(),
            error: ErrorBody {
                code: self.code(),
                details,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Response for panics caught by the outermost layer. Panics must never
/// leak a stack trace or message to the client.
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(error = %detail, "Handler panicked");

    let body = ErrorEnvelope {
        success: false,
        message: "Internal server error".to_string(),
        error: ErrorBody {
            code: "INTERNAL_ERROR",
            details: None,
        },
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
