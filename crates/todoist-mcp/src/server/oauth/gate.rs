//! Bearer-token gate for the protected routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use super::store::OAuthStore;
use crate::error::AuthError;
use crate::server::transport::HttpState;

/// Header carrying the optional shared secret.
pub const SECRET_HEADER: &str = "x-mcp-secret";

/// Check the bearer token and, if configured, the shared secret.
///
/// Checks run in order: token presence, token existence, token expiry
/// (expired tokens are deleted), shared secret.
pub async fn check_request(
    store: &OAuthStore,
    shared_secret: Option<&str>,
    headers: &HeaderMap,
) -> Result<(), AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    store.validate_access_token(token).await?;

    if let Some(expected) = shared_secret {
        let provided = headers.get(SECRET_HEADER).map(|v| v.as_bytes()).unwrap_or_default();
        if !bool::from(provided.ct_eq(expected.as_bytes())) {
            return Err(AuthError::Unauthorized);
        }
    }

    Ok(())
}

/// Middleware guarding every route it is layered on.
pub async fn require_bearer(
    State(state): State<Arc<HttpState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(err) =
        check_request(&state.oauth, state.shared_secret.as_deref(), request.headers()).await
    {
        tracing::warn!(error = %err, path = %request.uri().path(), "Rejected protected request");
        return Err(err);
    }

    Ok(next.run(request).await)
}
