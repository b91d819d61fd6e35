//! Error types for the Todoist MCP gateway.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Errors from the upstream HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Invalid upstream URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Non-success response from the task backend
    #[error("Todoist API returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body, as JSON when the backend sent JSON
        body: serde_json::Value,
    },
}

impl ClientError {
    /// Create an upstream error from a status and a raw body.
    #[must_use]
    pub fn upstream(status: u16, raw_body: &str) -> Self {
        let body = serde_json::from_str(raw_body)
            .unwrap_or_else(|_| serde_json::Value::String(raw_body.to_string()));
        Self::Upstream { status, body }
    }

    /// Returns the upstream status and body if the backend answered with an error.
    #[must_use]
    pub fn upstream_parts(&self) -> Option<(u16, &serde_json::Value)> {
        match self {
            Self::Upstream { status, body } => Some((*status, body)),
            _ => None,
        }
    }
}

/// Errors from MCP tool execution.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// Error from the upstream client
    #[error("API error: {0}")]
    Client(#[from] ClientError),

    /// A required argument was absent or empty
    #[error("Invalid params: {field} is required")]
    MissingParam {
        /// Name of the missing argument
        field: &'static str,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Create a missing-parameter error.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingParam { field }
    }
}

/// Plain-JSON rendering for the REST-style tool routes.
///
/// Upstream failures keep the backend's status and body.
impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        match &self {
            Self::MissingParam { field } => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": format!("{field}_required") })),
            )
                .into_response(),
            Self::Client(ClientError::Upstream { status, body }) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(body.clone()),
            )
                .into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// JSON-RPC 2.0 error codes used by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl RpcErrorCode {
    /// Numeric code carried on the wire.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }
}

/// OAuth and bearer-gate failures, rendered as `{"error": "<code>"}`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid_request")]
    InvalidRequest,
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,
    #[error("invalid_grant")]
    InvalidGrant,
    #[error("expired_code")]
    ExpiredCode,
    #[error("redirect_uri_mismatch")]
    RedirectUriMismatch,
    #[error("missing_token")]
    MissingToken,
    #[error("invalid_token")]
    InvalidToken,
    #[error("expired_token")]
    ExpiredToken,
    #[error("unauthorized")]
    Unauthorized,
}

impl AuthError {
    /// Wire error code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidGrant => "invalid_grant",
            Self::ExpiredCode => "expired_code",
            Self::RedirectUriMismatch => "redirect_uri_mismatch",
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::ExpiredToken => "expired_token",
            Self::Unauthorized => "unauthorized",
        }
    }

    /// HTTP status for this failure.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::ExpiredToken | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response =
            (status, Json(serde_json::json!({ "error": self.code() }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            let challenge = format!("Bearer error=\"{}\"", self.code());
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}
