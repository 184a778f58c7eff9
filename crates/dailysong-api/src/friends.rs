use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use dailysong_core::SocialError;
use dailysong_core::friendship::Response;
use dailysong_types::api::{
    PendingRequestResponse, RelationshipResponse, SendFriendRequest, SendFriendResponse,
};
use dailysong_types::models::{FriendRequest, User, UserSummary};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

pub async fn send_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SendFriendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let outcome = blocking(move || Ok(db.send_request(auth.user_id, req.to_user)?)).await?;

    let status = if outcome.auto_accepted { StatusCode::OK } else { StatusCode::CREATED };
    Ok((
        status,
        Json(SendFriendResponse {
            request_id: outcome.request.id,
            status: outcome.request.status,
            auto_accepted: outcome.auto_accepted,
        }),
    ))
}

/// A single request, visible to its sender and recipient only.
pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<FriendRequest>, ApiError> {
    let db = state.db.clone();
    let request = blocking(move || Ok(db.get_request(request_id)?))
        .await?
        .filter(|r| r.involves(auth.user_id))
        .ok_or(SocialError::NotFound)?;
    Ok(Json(request))
}

async fn respond(
    state: AppState,
    auth: AuthUser,
    request_id: Uuid,
    response: Response,
) -> Result<Json<FriendRequest>, ApiError> {
    let db = state.db.clone();
    let request =
        blocking(move || Ok(db.respond_to_request(request_id, auth.user_id, response)?)).await?;
    Ok(Json(request))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<FriendRequest>, ApiError> {
    respond(state, auth, request_id, Response::Accept).await
}

pub async fn reject_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<FriendRequest>, ApiError> {
    respond(state, auth, request_id, Response::Reject).await
}

pub async fn cancel_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<FriendRequest>, ApiError> {
    respond(state, auth, request_id, Response::Cancel).await
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let db = state.db.clone();
    blocking(move || Ok(db.remove_friendship(auth.user_id, user_id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn relationship(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let relationship = blocking(move || Ok(db.relationship(auth.user_id, user_id)?)).await?;
    Ok(Json(RelationshipResponse { user_id, relationship }))
}

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let friends = blocking(move || Ok(db.list_friends(auth.user_id)?)).await?;
    let summaries: Vec<UserSummary> = friends.iter().map(UserSummary::from).collect();
    Ok(Json(summaries))
}

pub async fn list_received(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let pending = blocking(move || Ok(db.list_pending_received(auth.user_id)?)).await?;
    Ok(Json(with_counterparts(pending)))
}

pub async fn list_sent(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let pending = blocking(move || Ok(db.list_pending_sent(auth.user_id)?)).await?;
    Ok(Json(with_counterparts(pending)))
}

fn with_counterparts(pending: Vec<(FriendRequest, User)>) -> Vec<PendingRequestResponse> {
    pending
        .into_iter()
        .map(|(request, user)| PendingRequestResponse {
            request,
            user: UserSummary::from(&user),
        })
        .collect()
}
