use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use dailysong_core::SocialError;

use crate::auth::AppState;
use crate::error::ApiError;

/// Identity of the caller, placed in request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// The bearer token the request came with, so logout can revoke it.
    pub token: String,
}

/// Resolve the bearer token from the Authorization header against the
/// session store.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(SocialError::Unauthenticated)?
        .to_string();

    let user_id = state
        .sessions
        .resolve(&token)
        .ok_or(SocialError::Unauthenticated)?;

    req.extensions_mut().insert(AuthUser { user_id, token });
    Ok(next.run(req).await)
}
