//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type. Only [`RelayError::InvalidGame`]
//! and [`RelayError::FetchFailed`] cross the game-source boundary; store
//! conflicts are booleans and command failures become reply text. On the
//! bridge surface each variant maps to an HTTP status and a structured JSON
//! body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ChannelId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "invalid game: game id must be positive, got 0",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                   |
/// |-----------|-------------------|-------------------------------|
/// | 1000–1999 | Request           | 400 / 401                     |
/// | 2000–2999 | Game source       | 422 / 502                     |
/// | 3000–3999 | Server            | 500 / 503                     |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The game identifier is not positive or its page cannot be parsed.
    #[error("invalid game: {0}")]
    InvalidGame(String),

    /// The game page could not be fetched within the backoff budget.
    #[error("failed to fetch {url} after {attempts} attempts: {reason}")]
    FetchFailed {
        /// URL that was requested.
        url: String,
        /// Number of requests made.
        attempts: u32,
        /// Last transport or HTTP error.
        reason: String,
    },

    /// Bridge request could not be understood.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Bridge did not present the expected token.
    #[error("missing or invalid bridge token")]
    Unauthorized,

    /// No connected bridge serves the channel.
    #[error("channel {0} is not reachable")]
    ChannelUnavailable(ChannelId),

    /// Subscription store failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Invalid or missing process configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A sleep was interrupted because the relay is shutting down.
    #[error("relay is shutting down")]
    ShuttingDown,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidCommand(_) => 1001,
            Self::Unauthorized => 1002,
            Self::InvalidGame(_) => 2001,
            Self::FetchFailed { .. } => 2002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Configuration(_) => 3002,
            Self::ChannelUnavailable(_) => 3003,
            Self::ShuttingDown => 3004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidGame(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::ChannelUnavailable(_) | Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Persistence(_) | Self::Configuration(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RelayError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
