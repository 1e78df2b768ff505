//! Bearer token authentication.
//!
//! Every users and todos route sits behind [`middleware::require_bearer`],
//! which extracts the token from `Authorization: Bearer <token>` and asks the
//! application's [`Authenticator`] whether to let the request through. The
//! status probes (`/`, `/health`) and the API docs are not gated.
//!
//! Failures short-circuit with 401 before any handler or database work:
//! a missing or malformed header yields "Not authenticated", a token the
//! authenticator rejects yields "Invalid or expired token".

pub mod middleware;

use async_trait::async_trait;

/// Decides whether a bearer token grants access.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> bool;
}

/// Accepts a fixed set of tokens from configuration.
#[derive(Debug, Clone)]
pub struct StaticTokens {
    tokens: Vec<String>,
}

impl StaticTokens {
    pub fn new(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Authenticator for StaticTokens {
    async fn authenticate(&self, token: &str) -> bool {
        self.tokens.iter().any(|known| known == token)
    }
}
