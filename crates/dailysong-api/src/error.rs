use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use dailysong_core::SocialError;
use dailysong_db::StoreError;
use dailysong_types::api::ErrorBody;

use crate::identity::IdentityError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Social(#[from] SocialError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("identity provider failed")]
    Upstream(#[from] IdentityError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Social(e) => Self::Social(e),
            StoreError::Sqlite(e) => Self::Internal(e.into()),
            StoreError::Internal(e) => Self::Internal(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Social(e) => match e {
                SocialError::SelfRequest => StatusCode::BAD_REQUEST,
                SocialError::AlreadyPending
                | SocialError::AlreadyFriends
                | SocialError::AlreadyPosted => StatusCode::CONFLICT,
                SocialError::NotFound | SocialError::NotFriends => StatusCode::NOT_FOUND,
                SocialError::Unauthenticated => StatusCode::UNAUTHORIZED,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => error!("Internal error: {:#}", e),
            Self::Upstream(e) => error!("Identity provider error: {}", e),
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Runs blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
    })?
}
