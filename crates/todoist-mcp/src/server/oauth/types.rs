//! OAuth 2.0 types for MCP authentication.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Records that stop being valid at a fixed instant.
pub trait Expiring {
    fn expires_at(&self) -> Instant;

    /// Expired once `now` is strictly past the expiry instant.
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at() < now
    }
}

/// An authorization code issued on an authorize request.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub expires_at: Instant,
}

/// An access token for the protected routes.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub scope: String,
    pub expires_at: Instant,
}

impl Expiring for AuthCode {
    fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

impl Expiring for AccessToken {
    fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

/// Query parameters of `GET /oauth/authorize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeParams {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
}

/// Body of `POST /oauth/token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenParams {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
}

/// Successful token response.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub scope: String,
}
