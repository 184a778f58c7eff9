use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use dailysong_core::session::SessionStore;
use dailysong_core::{Clock, SocialError};
use dailysong_db::Database;
use dailysong_types::api::{CallbackQuery, LoginUrlResponse, SessionResponse};

use crate::error::{ApiError, blocking};
use crate::identity::IdentityProvider;
use crate::middleware::AuthUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

pub async fn login(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let authorization_url = state.identity.authorization_url()?;
    Ok(Json(LoginUrlResponse { authorization_url }))
}

/// Finishes the OAuth redirect: verifies the code with the provider, creates
/// or refreshes the user and starts a session.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(error) = query.error {
        warn!("Login denied by provider: {}", error);
        return Err(ApiError::BadRequest(format!("authorization failed: {error}")));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing authorization code".into()))?;

    let profile = state.identity.exchange_code(&code).await?;

    let db = state.db.clone();
    let user = blocking(move || Ok(db.upsert_user(&profile)?)).await?;

    let issued = state.sessions.issue(user.id);
    info!("User {} logged in", user.id);

    Ok(Json(SessionResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> StatusCode {
    state.sessions.revoke(&auth.token);
    info!("User {} logged out", auth.user_id);
    StatusCode::NO_CONTENT
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user = blocking(move || Ok(db.get_user(auth.user_id)?))
        .await?
        .ok_or(SocialError::NotFound)?;
    Ok(Json(user))
}
