//! Route guard requiring a valid bearer token.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tracing::instrument;

use crate::AppState;
use crate::errors::{Error, Result};

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let missing = || Error::Unauthenticated { message: None };

    let value = headers.get(header::AUTHORIZATION).ok_or_else(missing)?;
    let value = value.to_str().map_err(|_| missing())?;
    let (scheme, token) = value.trim().split_once(' ').ok_or_else(missing)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(missing());
    }

    Ok(token)
}

/// Reject the request with 401 unless it carries a token the authenticator accepts.
#[instrument(skip_all)]
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    let token = bearer_token(request.headers())?;

    if !state.authenticator.authenticate(token).await {
        return Err(Error::Unauthenticated {
            message: Some("Invalid or expired token".to_string()),
        });
    }

    Ok(next.run(request).await)
}
