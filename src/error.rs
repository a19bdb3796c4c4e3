use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type
///
/// Every failed request ends in exactly one of these. Client errors carry
/// enough detail for the caller; server errors are logged in full and
/// answered with a generic body.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Request Errors =====
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("One-time token mismatch")]
    TokenMismatch,

    #[error("Method not allowed")]
    MethodNotAllowed,

    // ===== Authentication & Authorization Errors =====
    #[error("Authentication required: {reason}")]
    Unauthenticated {
        reason: String,
        /// `WWW-Authenticate` challenge, when Basic auth is in use
        challenge: Option<String>,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ===== Storage & Rendering Errors =====
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Render error: {0}")]
    Render(String),

    // ===== Internal Server Errors =====
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    ///
    /// Methods other than the handled ones answer 400, not 405.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MalformedRequest(_) | AppError::TokenMismatch | AppError::MethodNotAllowed => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Render(_)
            | AppError::Internal(_)
            | AppError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::MalformedRequest(_) | AppError::TokenMismatch | AppError::MethodNotAllowed => {
                "Bad Request".to_string()
            }
            AppError::Unauthenticated { .. } => "Authentication required".to_string(),
            AppError::Forbidden(_) => "Forbidden".to_string(),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::Database(_) => "Database error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AppError::TokenMismatch => "TOKEN_MISMATCH",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::Unauthenticated { .. } => "AUTH_REQUIRED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(
                error = %self,
                error_code = %code,
                "Access denied"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let error_code = self.error_code();

        // For server errors, don't expose internal details to client
        let body = if status.is_server_error() {
            json!({
                "error": "Internal server error",
                "error_code": error_code,
                "status": status.as_u16(),
            })
        } else {
            json!({
                "error": self.user_message(),
                "error_code": error_code,
                "status": status.as_u16(),
            })
        };

        let mut response = (status, axum::Json(body)).into_response();

        if let AppError::Unauthenticated {
            challenge: Some(challenge),
            ..
        } = &self
        {
            if let Ok(value) = HeaderValue::from_str(challenge) {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create a malformed-request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        AppError::MalformedRequest(msg.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Create an internal server error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Create an authentication error, optionally carrying a challenge
    pub fn unauthenticated(reason: impl Into<String>, challenge: Option<String>) -> Self {
        AppError::Unauthenticated {
            reason: reason.into(),
            challenge,
        }
    }
}
