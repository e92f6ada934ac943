// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Identity-provider failures carry an [`AuthErrorCode`] from a fixed table;
//! the table maps each code to the string shown to the user.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Fallback message when the provider gives us nothing usable.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Error codes reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    WeakPassword,
    UserNotFound,
    WrongPassword,
    TooManyRequests,
    UserDisabled,
    RequiresRecentLogin,
    PopupClosedByUser,
    InvalidActionCode,
    /// Anything outside the table; the raw provider message is surfaced.
    Other,
}

impl AuthErrorCode {
    /// Stable code string, in the provider's `auth/...` namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::UserDisabled => "auth/user-disabled",
            AuthErrorCode::RequiresRecentLogin => "auth/requires-recent-login",
            AuthErrorCode::PopupClosedByUser => "auth/popup-closed-by-user",
            AuthErrorCode::InvalidActionCode => "auth/invalid-action-code",
            AuthErrorCode::Other => "auth/internal-error",
        }
    }

    /// User-facing message for this code. `raw` is only used for
    /// [`AuthErrorCode::Other`].
    pub fn user_message(&self, raw: &str) -> String {
        let message = match self {
            AuthErrorCode::EmailAlreadyInUse => {
                "This email is already in use. Please try a different one or login."
            }
            AuthErrorCode::InvalidEmail => "Invalid email address. Please check and try again.",
            AuthErrorCode::WeakPassword => {
                "Password is too weak. Please use a stronger password."
            }
            AuthErrorCode::UserNotFound => {
                "User not found. Please check your email or create an account."
            }
            AuthErrorCode::WrongPassword => {
                "Incorrect password. Please try again or reset your password."
            }
            AuthErrorCode::TooManyRequests => {
                "Too many unsuccessful login attempts. Please try again later."
            }
            AuthErrorCode::UserDisabled => {
                "This account has been disabled. Please contact support."
            }
            AuthErrorCode::RequiresRecentLogin => {
                "This operation requires a recent login. Please log out and log back in."
            }
            AuthErrorCode::PopupClosedByUser => {
                "Authentication popup was closed before completion."
            }
            AuthErrorCode::InvalidActionCode => {
                "This verification link is invalid or has expired. Please request a new verification email."
            }
            AuthErrorCode::Other if raw.trim().is_empty() => UNEXPECTED_ERROR_MESSAGE,
            AuthErrorCode::Other => raw,
        };
        message.to_string()
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an identity provider implementation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: AuthErrorCode,
    /// Raw provider message (not shown to users unless the code is unmapped).
    pub message: String,
}

impl ProviderError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Provider failure outside the error table (transport, parse, ...).
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::Other, message)
    }

    pub fn user_message(&self) -> String {
        self.code.user_message(&self.message)
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Raised locally before attempting an operation that needs a session.
    #[error("No user is currently logged in.")]
    NotLoggedIn,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Provider error code, if this error came from the identity provider.
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self {
            AppError::Provider(e) => Some(e.code),
            _ => None,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotLoggedIn => (
                StatusCode::UNAUTHORIZED,
                "not_logged_in",
                Some(self.to_string()),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Provider(e) if e.code == AuthErrorCode::Other => {
                tracing::warn!(error = %e, "Identity provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    Some(e.user_message()),
                )
            }
            AppError::Provider(e) => (StatusCode::BAD_REQUEST, e.code.as_str(), Some(e.user_message())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and facade operations.
pub type Result<T> = std::result::Result<T, AppError>;
