use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::models::UserProfile;

/// Caller identity resolved by the guard, available to handlers as an extension.
#[derive(Clone, Debug)]
pub struct Identity(pub UserProfile);

/// Authorization guard: resolves the bearer token through the identity
/// gateway before any resource handler runs.
///
/// Tokens are re-resolved on every request; nothing is cached.
pub async fn require_identity(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(|msg| {
        tracing::warn!("Rejected request to {}: {}", request.uri().path(), msg);
        ApiError::unauthenticated(msg)
    })?;

    let user = state.identity.resolve_token(&token).await.map_err(|e| {
        tracing::warn!("Token resolution failed for {}: {}", request.uri().path(), e);
        ApiError::from(e)
    })?;

    tracing::debug!("Authenticated user {} for {}", user.id, request.uri().path());
    request.extensions_mut().insert(Identity(user));

    Ok(next.run(request).await)
}

/// Token from the Authorization header; the `Bearer` scheme is optional and
/// matched case-insensitively.
fn extract_bearer(headers: &HeaderMap) -> Result<String, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Authorization token is missing")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?
        .trim();

    let token = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if header.eq_ignore_ascii_case("bearer") => "",
        _ => header,
    };
    if token.is_empty() {
        return Err("Authorization token is missing");
    }
    Ok(token.to_string())
}
