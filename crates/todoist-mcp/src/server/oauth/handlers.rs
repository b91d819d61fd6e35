//! OAuth 2.0 endpoint handlers.
//!
//! Implements:
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 6749: Authorization Code Grant (auto-approved, no client authentication)

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::types::{AuthorizeParams, IssuedToken, TokenParams};
use crate::server::transport::HttpState;

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
///
/// Describes the OAuth endpoints and capabilities. Needs `ISSUER_BASE`.
pub async fn handle_auth_server_metadata(State(state): State<Arc<HttpState>>) -> Response {
    let Some(ref issuer) = state.issuer_base else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "ISSUER_BASE missing" })),
        )
            .into_response();
    };

    Json(serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["none", "client_secret_post"],
        "code_challenge_methods_supported": ["plain"]
    }))
    .into_response()
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

/// `GET /oauth/authorize`
///
/// Auto-approves the request: there is no login page, the code is minted
/// immediately and the user agent redirected back to the client.
pub async fn handle_authorize(
    State(state): State<Arc<HttpState>>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    match state.oauth.issue_code(&params).await {
        Ok(grant) => {
            tracing::info!(
                client_id = params.client_id.as_deref().unwrap_or_default(),
                "Auto-approved authorization"
            );
            (StatusCode::FOUND, [(header::LOCATION, grant.redirect_to.to_string())]).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected authorization request");
            err.into_response()
        }
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

/// Token request body, accepted as JSON or as a urlencoded form.
///
/// A body that fails to parse is treated as empty, which the exchange then
/// rejects as `unsupported_grant_type`.
#[derive(Debug, Default)]
pub struct TokenForm(pub TokenParams);

impl<S> FromRequest<S> for TokenForm
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let body = Bytes::from_request(req, state).await.unwrap_or_default();

        let params = if is_json {
            serde_json::from_slice(&body).ok()
        } else {
            serde_urlencoded::from_bytes(&body).ok()
        };

        Ok(Self(params.unwrap_or_default()))
    }
}

/// `POST /oauth/token`
///
/// Exchange an authorization code for an access token.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    TokenForm(params): TokenForm,
) -> Response {
    match state.oauth.exchange_code(&params).await {
        Ok(issued) => {
            tracing::info!(scope = %issued.scope, "Issued access token");
            token_success(&issued)
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected token request");
            err.into_response()
        }
    }
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(issued: &IssuedToken) -> Response {
    let mut response = Json(issued).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}
