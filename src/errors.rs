use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

/// Error
///
/// The single error type flowing out of handlers, the repository, and the
/// auth layer. Every variant is scoped to one request; none is fatal to the
/// process. `IntoResponse` maps each variant to a status code and a
/// user-safe JSON body, logging the full detail server-side.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Registration conflict: an account with the submitted email exists.
    #[error("an account with this email address already exists")]
    DuplicateEmail,

    /// Login failure. Deliberately identical for "unknown email" and
    /// "wrong password" so accounts cannot be enumerated.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A route requiring a session was called without a valid one.
    #[error("authentication required")]
    Unauthenticated,

    /// The admin gate rejected the request. Covers both "no session" and
    /// "session without the admin capability"; callers cannot tell which.
    #[error("access denied")]
    Forbidden,

    /// Requested resource does not exist.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Invalid request data or business rule violation.
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error.
    #[error("failed to {operation}")]
    Internal { operation: String },

    /// Database operation error.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidCredentials | Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Error::DuplicateEmail => "An account with this email address already exists".to_string(),
            Error::InvalidCredentials => "Invalid email or password".to_string(),
            Error::Unauthenticated => "Authentication required".to_string(),
            Error::Forbidden => "Access denied".to_string(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } | Error::Database(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Full detail goes to the log; severity depends on the variant.
        match &self {
            Error::Internal { .. } | Error::Database(_) => {
                tracing::error!("internal service error: {:#}", self);
            }
            Error::Unauthenticated | Error::InvalidCredentials | Error::Forbidden => {
                tracing::info!("authorization error: {}", self);
            }
            Error::DuplicateEmail => {
                tracing::warn!("registration conflict: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("client error: {}", self);
            }
        }

        let body = json!({ "message": self.user_message() });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Type alias for service operation results.
pub type Result<T> = std::result::Result<T, Error>;
