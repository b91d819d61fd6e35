//! In-memory OAuth store: authorization codes and access tokens.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

use super::types::{AccessToken, AuthCode, AuthorizeParams, Expiring, IssuedToken, TokenParams};
use crate::error::AuthError;

/// Auth code lifetime: 5 minutes.
pub const AUTH_CODE_LIFETIME: Duration = Duration::from_secs(300);
/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
/// Cleanup interval: 5 minutes.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Random bytes behind an authorization code.
const CODE_BYTES: usize = 24;
/// Random bytes behind an access token.
const TOKEN_BYTES: usize = 32;

/// Keyed storage for short-lived credentials.
///
/// Keys are the opaque credential strings. Records are never rewritten after
/// insertion, only removed.
#[async_trait::async_trait]
pub trait CredentialStore<V>: Send + Sync {
    async fn get(&self, key: &str) -> Option<V>;

    /// Insert unless the key is taken. Returns `false` on collision.
    async fn insert_new(&self, key: String, value: V) -> bool;

    /// Remove and return a record. Only one concurrent caller gets `Some`.
    async fn remove(&self, key: &str) -> Option<V>;

    /// Drop every record expired at `now`, returning how many went.
    async fn purge_expired(&self, now: Instant) -> usize;

    async fn len(&self) -> usize;
}

/// `CredentialStore` backed by a `RwLock<HashMap>`.
pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<V> CredentialStore<V> for MemoryStore<V>
where
    V: Expiring + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        self.entries.read().await.get(key).cloned()
    }

    async fn insert_new(&self, key: String, value: V) -> bool {
        match self.entries.write().await.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    async fn remove(&self, key: &str) -> Option<V> {
        self.entries.write().await.remove(key)
    }

    async fn purge_expired(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, record| !record.is_expired_at(now));
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Result of a successful authorize request.
#[derive(Debug, Clone)]
pub struct AuthorizationGrant {
    pub code: String,
    /// Where to send the user agent: the client's redirect URI carrying `code` and `state`.
    pub redirect_to: Url,
}

/// In-memory OAuth state store.
#[derive(Clone)]
pub struct OAuthStore {
    auth_codes: Arc<dyn CredentialStore<AuthCode>>,
    access_tokens: Arc<dyn CredentialStore<AccessToken>>,
}

impl OAuthStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(MemoryStore::<AuthCode>::new()),
            Arc::new(MemoryStore::<AccessToken>::new()),
        )
    }

    /// Build on top of custom code and token stores.
    #[must_use]
    pub fn with_stores(
        auth_codes: Arc<dyn CredentialStore<AuthCode>>,
        access_tokens: Arc<dyn CredentialStore<AccessToken>>,
    ) -> Self {
        Self { auth_codes, access_tokens }
    }

    /// Hex-encode `N` bytes from the thread-local CSPRNG.
    fn generate_token<const N: usize>() -> String
    where
        rand::distributions::Standard: rand::distributions::Distribution<[u8; N]>,
    {
        let bytes: [u8; N] = rand::thread_rng().r#gen();
        hex::encode(bytes)
    }

    /// Issue an authorization code for an authorize request.
    ///
    /// Nothing is stored unless the request is well formed.
    pub async fn issue_code(&self, params: &AuthorizeParams) -> Result<AuthorizationGrant, AuthError> {
        let client_id = present(params.client_id.as_deref());
        let redirect_uri = present(params.redirect_uri.as_deref());

        let (Some(client_id), Some(redirect_uri)) = (client_id, redirect_uri) else {
            return Err(AuthError::InvalidRequest);
        };
        if params.response_type.as_deref() != Some("code") {
            return Err(AuthError::InvalidRequest);
        }
        let redirect_url = Url::parse(redirect_uri).map_err(|_| AuthError::InvalidRequest)?;

        let record = AuthCode {
            client_id: client_id.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            scope: params.scope.clone().unwrap_or_default(),
            expires_at: Instant::now() + AUTH_CODE_LIFETIME,
        };

        let code = loop {
            let candidate = Self::generate_token::<CODE_BYTES>();
            if self.auth_codes.insert_new(candidate.clone(), record.clone()).await {
                break candidate;
            }
        };

        let redirect_to = redirect_with_code(&redirect_url, &code, present(params.state.as_deref()));
        Ok(AuthorizationGrant { code, redirect_to })
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, params: &TokenParams) -> Result<IssuedToken, AuthError> {
        let code = present(params.code.as_deref());
        let (Some("authorization_code"), Some(code)) = (params.grant_type.as_deref(), code) else {
            return Err(AuthError::UnsupportedGrantType);
        };

        let record = self.auth_codes.get(code).await.ok_or(AuthError::InvalidGrant)?;

        if record.is_expired_at(Instant::now()) {
            let _ = self.auth_codes.remove(code).await;
            return Err(AuthError::ExpiredCode);
        }

        if let Some(redirect_uri) = present(params.redirect_uri.as_deref()) {
            if redirect_uri != record.redirect_uri {
                // The code stays redeemable with the right redirect_uri.
                return Err(AuthError::RedirectUriMismatch);
            }
        }

        // Whoever removes the code wins; a concurrent exchange sees it gone.
        let record = self.auth_codes.remove(code).await.ok_or(AuthError::InvalidGrant)?;

        let access_token = loop {
            let candidate = Self::generate_token::<TOKEN_BYTES>();
            let token = AccessToken {
                scope: record.scope.clone(),
                expires_at: Instant::now() + ACCESS_TOKEN_LIFETIME,
            };
            if self.access_tokens.insert_new(candidate.clone(), token).await {
                break candidate;
            }
        };

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: ACCESS_TOKEN_LIFETIME.as_secs(),
            scope: record.scope,
        })
    }

    /// Validate an access token, deleting it if it has expired.
    pub async fn validate_access_token(&self, token: &str) -> Result<AccessToken, AuthError> {
        let record = self.access_tokens.get(token).await.ok_or(AuthError::InvalidToken)?;

        if record.is_expired_at(Instant::now()) {
            let _ = self.access_tokens.remove(token).await;
            return Err(AuthError::ExpiredToken);
        }

        Ok(record)
    }

    /// Number of live (not yet removed) codes and tokens.
    pub async fn counts(&self) -> (usize, usize) {
        (self.auth_codes.len().await, self.access_tokens.len().await)
    }

    /// Start background cleanup task for expired tokens and codes.
    pub fn start_cleanup_task(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                store.cleanup_expired().await;
            }
        })
    }

    /// Remove every expired code and token.
    pub async fn cleanup_expired(&self) {
        let now = Instant::now();

        let codes = self.auth_codes.purge_expired(now).await;
        if codes > 0 {
            tracing::debug!(count = codes, "Cleaned up expired authorization codes");
        }

        let tokens = self.access_tokens.purge_expired(now).await;
        if tokens > 0 {
            tracing::debug!(count = tokens, "Cleaned up expired access tokens");
        }
    }
}

impl Default for OAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OAuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthStore").finish()
    }
}

/// Treat empty strings like absent parameters.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Set `code` (and `state`, when given) on the redirect URI, replacing any
/// existing values while keeping other query parameters.
fn redirect_with_code(redirect_uri: &Url, code: &str, state: Option<&str>) -> Url {
    let kept: Vec<(String, String)> = redirect_uri
        .query_pairs()
        .filter(|(k, _)| *k != "code" && !(state.is_some() && *k == "state"))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = redirect_uri.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.extend_pairs(kept);
        pairs.append_pair("code", code);
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authorize(state: Option<&str>) -> AuthorizeParams {
        AuthorizeParams {
            client_id: Some("c1".into()),
            redirect_uri: Some("https://cb.example/cb".into()),
            response_type: Some("code".into()),
            state: state.map(Into::into),
            scope: Some("tasks".into()),
        }
    }

    fn token_request(code: &str) -> TokenParams {
        TokenParams {
            grant_type: Some("authorization_code".into()),
            code: Some(code.into()),
            redirect_uri: None,
        }
    }

    #[tokio::test]
    async fn test_code_is_hex_of_24_bytes() {
        let store = OAuthStore::new();
        let grant = store.issue_code(&authorize(None)).await.unwrap();
        assert_eq!(grant.code.len(), CODE_BYTES * 2);
        assert!(grant.code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_redirect_carries_code_and_state() {
        let store = OAuthStore::new();
        let grant = store.issue_code(&authorize(Some("s1"))).await.unwrap();
        assert_eq!(
            grant.redirect_to.as_str(),
            format!("https://cb.example/cb?code={}&state=s1", grant.code)
        );
    }

    #[test]
    fn test_redirect_replaces_existing_code() {
        let base = Url::parse("https://cb.example/cb?keep=1&code=old").unwrap();
        let url = redirect_with_code(&base, "new", None);
        assert_eq!(url.as_str(), "https://cb.example/cb?keep=1&code=new");
    }

    #[tokio::test]
    async fn test_issue_rejects_bad_requests_without_storing() {
        let store = OAuthStore::new();

        let mut params = authorize(None);
        params.response_type = Some("token".into());
        assert_eq!(store.issue_code(&params).await.unwrap_err(), AuthError::InvalidRequest);

        let mut params = authorize(None);
        params.client_id = None;
        assert_eq!(store.issue_code(&params).await.unwrap_err(), AuthError::InvalidRequest);

        let mut params = authorize(None);
        params.redirect_uri = Some(String::new());
        assert_eq!(store.issue_code(&params).await.unwrap_err(), AuthError::InvalidRequest);

        let mut params = authorize(None);
        params.redirect_uri = Some("not a url".into());
        assert_eq!(store.issue_code(&params).await.unwrap_err(), AuthError::InvalidRequest);

        assert_eq!(store.counts().await, (0, 0));
    }

    #[tokio::test]
    async fn test_exchange_returns_bearer_token() {
        let store = OAuthStore::new();
        let grant = store.issue_code(&authorize(None)).await.unwrap();

        let issued = store.exchange_code(&token_request(&grant.code)).await.unwrap();
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(issued.scope, "tasks");
        assert_eq!(issued.access_token.len(), TOKEN_BYTES * 2);

        let token = store.validate_access_token(&issued.access_token).await.unwrap();
        assert_eq!(token.scope, "tasks");
    }

    #[tokio::test]
    async fn test_unsupported_grant_type_checked_first() {
        let store = OAuthStore::new();
        let mut params = token_request("whatever");
        params.grant_type = Some("refresh_token".into());
        assert_eq!(store.exchange_code(&params).await.unwrap_err(), AuthError::UnsupportedGrantType);

        let params = TokenParams { grant_type: Some("authorization_code".into()), ..TokenParams::default() };
        assert_eq!(store.exchange_code(&params).await.unwrap_err(), AuthError::UnsupportedGrantType);
    }

    #[tokio::test]
    async fn test_memory_store_refuses_duplicate_keys() {
        let store: MemoryStore<AccessToken> = MemoryStore::new();
        let token = AccessToken { scope: String::new(), expires_at: Instant::now() };
        assert!(store.insert_new("k".into(), token.clone()).await);
        assert!(!store.insert_new("k".into(), token).await);
        assert_eq!(store.len().await, 1);
    }
}
