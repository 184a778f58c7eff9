use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::{self, AppState};
use crate::friends;
use crate::middleware::require_auth;
use crate::posts;

/// All HTTP routes. Cross-cutting layers (CORS, tracing) are added by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/posts", post(posts::create_post).get(posts::list_my_posts))
        .route("/posts/today", get(posts::today_post))
        .route("/streak/rebuild", post(posts::rebuild_streak))
        .route("/users/{user_id}/posts", get(posts::list_user_posts))
        .route("/friends", get(friends::list_friends))
        .route("/friends/{user_id}", delete(friends::remove_friend))
        .route("/friends/{user_id}/status", get(friends::relationship))
        .route("/friends/requests", post(friends::send_request))
        .route("/friends/requests/received", get(friends::list_received))
        .route("/friends/requests/sent", get(friends::list_sent))
        .route("/friends/requests/{request_id}", get(friends::get_request))
        .route("/friends/requests/{request_id}/accept", post(friends::accept_request))
        .route("/friends/requests/{request_id}/reject", post(friends::reject_request))
        .route("/friends/requests/{request_id}/cancel", post(friends::cancel_request))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
