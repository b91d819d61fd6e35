//! OAuth 2.0 authorization server for MCP authentication.
//!
//! A minimal, self-contained authorization-code flow embedded in the binary:
//! codes are auto-approved, single use, and live 5 minutes; bearer tokens
//! live 1 hour. No PKCE, client authentication, or refresh tokens.

pub mod gate;
pub mod handlers;
pub mod store;
pub mod types;

pub use store::{CredentialStore, MemoryStore, OAuthStore};
