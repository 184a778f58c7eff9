use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use dailysong_core::SocialError;
use dailysong_types::api::{CreatePostRequest, CreatePostResponse, StreakResponse};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

const MAX_FIELD_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// Posts the caller's song of the day. "Today" comes from the server clock,
/// never from the client.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let song = req.into_song();
    if song.song_name.is_empty() || song.artist_name.is_empty() {
        return Err(ApiError::BadRequest("song_name and artist_name are required".into()));
    }
    let too_long = [Some(&song.song_name), Some(&song.artist_name)]
        .into_iter()
        .chain([song.album_name.as_ref(), song.track_url.as_ref(), song.album_image_url.as_ref()])
        .flatten()
        .any(|field| field.len() > MAX_FIELD_LEN);
    if too_long {
        return Err(ApiError::BadRequest(format!("fields are limited to {MAX_FIELD_LEN} bytes")));
    }

    let today = state.clock.today();
    let db = state.db.clone();
    let (post, streak) = blocking(move || Ok(db.create_post(auth.user_id, today, &song)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            post,
            streak: streak.into(),
        }),
    ))
}

/// The caller's post for the server's current date, if any.
pub async fn today_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let today = state.clock.today();
    let db = state.db.clone();
    let post = blocking(move || Ok(db.get_post_on(auth.user_id, today)?))
        .await?
        .ok_or(SocialError::NotFound)?;
    Ok(Json(post))
}

pub async fn list_my_posts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<PostQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let limit = query.limit.min(200);
    let posts = blocking(move || Ok(db.list_posts(auth.user_id, limit)?)).await?;
    Ok(Json(posts))
}

/// Another user's posts. Only visible to friends; everyone else gets 404.
pub async fn list_user_posts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PostQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let limit = query.limit.min(200);
    let posts = blocking(move || {
        if user_id != auth.user_id && !db.are_friends(auth.user_id, user_id)? {
            return Err(SocialError::NotFound.into());
        }
        Ok(db.list_posts(user_id, limit)?)
    })
    .await?;
    Ok(Json(posts))
}

/// Recomputes the caller's streak from their post history.
pub async fn rebuild_streak(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let streak = blocking(move || Ok(db.rebuild_streak(auth.user_id)?))
        .await?
        .ok_or(SocialError::NotFound)?;
    Ok(Json(StreakResponse::from(streak)))
}
