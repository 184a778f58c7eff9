//! Drives the full router with an in-memory database, a hand-moved clock
//! and a fake identity provider.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use dailysong_api::identity::{IdentityError, IdentityProvider};
use dailysong_api::routes::router;
use dailysong_api::{AppState, AppStateInner};
use dailysong_core::ManualClock;
use dailysong_core::session::SessionStore;
use dailysong_db::Database;
use dailysong_types::models::ExternalProfile;

/// Treats the authorization code as the external user id.
struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self) -> Result<String, IdentityError> {
        Ok("https://accounts.example/authorize?client_id=test".into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, IdentityError> {
        if code == "denied" {
            return Err(IdentityError::Rejected("bad code".into()));
        }
        Ok(ExternalProfile {
            external_id: code.to_string(),
            display_name: Some(code.to_uppercase()),
            profile_image_url: None,
            country: None,
        })
    }
}

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::at_date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
    let db = Database::open_in_memory(clock.clone()).unwrap();
    let state: AppState = Arc::new(AppStateInner {
        db: Arc::new(db),
        sessions: Arc::new(SessionStore::with_default_ttl(clock.clone())),
        identity: Arc::new(FakeIdentity),
        clock: clock.clone(),
    });
    Harness { app: router(state), clock }
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

/// Logs in through the callback and returns (token, user id).
async fn login(app: &Router, code: &str) -> (String, String) {
    let (status, body) = call(app, Method::GET, &format!("/auth/callback?code={code}"), None, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

fn song(name: &str) -> Value {
    json!({ "song_name": name, "artist_name": "ILLIT" })
}

#[tokio::test]
async fn protected_routes_need_a_live_token() {
    let h = harness();

    let (status, _) = call(&h.app, Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&h.app, Method::GET, "/me", Some("made-up"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (token, user_id) = login(&h.app, "alice").await;
    let (status, me) = call(&h.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["current_streak"], 0);

    h.clock.advance(Duration::hours(24) + Duration::seconds(1));
    let (status, _) = call(&h.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_errors_are_reported() {
    let h = harness();

    let (status, body) = call(&h.app, Method::GET, "/auth/login", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["authorization_url"].as_str().unwrap().starts_with("https://"));

    let (status, _) = call(&h.app, Method::GET, "/auth/callback", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&h.app, Method::GET, "/auth/callback?error=access_denied", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&h.app, Method::GET, "/auth/callback?code=denied", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn logout_revokes_only_that_token() {
    let h = harness();
    let (first, _) = login(&h.app, "alice").await;
    let (second, _) = login(&h.app, "alice").await;

    let (status, _) = call(&h.app, Method::POST, "/auth/logout", Some(&first), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&h.app, Method::GET, "/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&h.app, Method::GET, "/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn daily_posts_drive_the_streak() {
    let h = harness();
    let (token, _) = login(&h.app, "alice").await;

    let (status, body) = call(&h.app, Method::POST, "/posts", Some(&token), Some(song("jellyous"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["post"]["posted_date"], "2024-01-05");
    assert_eq!(body["streak"]["current_streak"], 1);

    let (status, _) = call(&h.app, Method::POST, "/posts", Some(&token), Some(song("Magnetic"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Each jump outlives the 24h session, so log in again.
    h.clock.advance(Duration::days(1));
    let (token, _) = login(&h.app, "alice").await;
    let (status, body) =
        call(&h.app, Method::POST, "/posts", Some(&token), Some(song("Lucky Girl Syndrome"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["streak"]["current_streak"], 2);
    assert_eq!(body["streak"]["longest_streak"], 2);

    h.clock.advance(Duration::days(4));
    let (status, _) = call(&h.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (token, _) = login(&h.app, "alice").await;
    let (status, body) = call(&h.app, Method::POST, "/posts", Some(&token), Some(song("Cherish"))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["streak"]["current_streak"], 1);
    assert_eq!(body["streak"]["longest_streak"], 2);
    assert_eq!(body["streak"]["last_post_date"], "2024-01-10");

    let (status, posts) = call(&h.app, Method::GET, "/posts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts.as_array().unwrap().len(), 3);
    assert_eq!(posts[0]["song_name"], "Cherish");

    let (status, streak) = call(&h.app, Method::POST, "/streak/rebuild", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(streak["current_streak"], 1);
    assert_eq!(streak["longest_streak"], 2);
}

#[tokio::test]
async fn today_post_follows_the_server_date() {
    let h = harness();
    let (token, _) = login(&h.app, "alice").await;

    let (status, _) = call(&h.app, Method::GET, "/posts/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&h.app, Method::POST, "/posts", Some(&token), Some(song("Supernova"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, today) = call(&h.app, Method::GET, "/posts/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today["song_name"], "Supernova");
    assert_eq!(today["posted_date"], "2024-01-05");

    h.clock.advance(Duration::hours(12));
    let (status, _) = call(&h.app, Method::GET, "/posts/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    h.clock.advance(Duration::hours(12));
    let (status, _) = call(&h.app, Method::GET, "/posts/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_validation() {
    let h = harness();
    let (token, _) = login(&h.app, "alice").await;

    let blank = json!({ "song_name": "  ", "artist_name": "ILLIT" });
    let (status, _) = call(&h.app, Method::POST, "/posts", Some(&token), Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = call(&h.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(me["current_streak"], 0);
}

#[tokio::test]
async fn friendship_lifecycle() {
    let h = harness();
    let (alice, alice_id) = login(&h.app, "alice").await;
    let (bob, bob_id) = login(&h.app, "bob").await;

    let (status, _) = call(
        &h.app,
        Method::POST,
        "/friends/requests",
        Some(&alice),
        Some(json!({ "to_user": alice_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent) = call(
        &h.app,
        Method::POST,
        "/friends/requests",
        Some(&alice),
        Some(json!({ "to_user": bob_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["status"], "pending");
    let request_id = sent["request_id"].as_str().unwrap().to_string();

    let (_, status_body) = call(&h.app, Method::GET, &format!("/friends/{bob_id}/status"), Some(&alice), None).await;
    assert_eq!(status_body["relationship"], "request_sent");

    let single = format!("/friends/requests/{request_id}");
    let (status, fetched) = call(&h.app, Method::GET, &single, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["from_user"], alice_id.as_str());
    assert_eq!(fetched["status"], "pending");
    let (carol, _) = login(&h.app, "carol").await;
    let (status, _) = call(&h.app, Method::GET, &single, Some(&carol), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, received) = call(&h.app, Method::GET, "/friends/requests/received", Some(&bob), None).await;
    assert_eq!(received[0]["user"]["id"], alice_id.as_str());

    // Alice cannot accept her own request, and Bob's posts stay hidden.
    let accept = format!("/friends/requests/{request_id}/accept");
    let (status, _) = call(&h.app, Method::POST, &accept, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&h.app, Method::GET, &format!("/users/{bob_id}/posts"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, accepted) = call(&h.app, Method::POST, &accept, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");
    let (status, _) = call(&h.app, Method::POST, &accept, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &h.app,
        Method::POST,
        "/friends/requests",
        Some(&alice),
        Some(json!({ "to_user": bob_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    call(&h.app, Method::POST, "/posts", Some(&bob), Some(song("Tick-Tack"))).await;
    let (status, posts) = call(&h.app, Method::GET, &format!("/users/{bob_id}/posts"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posts.as_array().unwrap().len(), 1);

    let (_, friends) = call(&h.app, Method::GET, "/friends", Some(&alice), None).await;
    assert_eq!(friends[0]["id"], bob_id.as_str());
    assert_eq!(friends[0]["current_streak"], 1);

    let (status, _) = call(&h.app, Method::DELETE, &format!("/friends/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, status_body) = call(&h.app, Method::GET, &format!("/friends/{bob_id}/status"), Some(&alice), None).await;
    assert_eq!(status_body["relationship"], "none");
    let (status, _) = call(&h.app, Method::DELETE, &format!("/friends/{bob_id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mutual_requests_auto_accept() {
    let h = harness();
    let (alice, alice_id) = login(&h.app, "alice").await;
    let (bob, bob_id) = login(&h.app, "bob").await;

    let (_, first) = call(
        &h.app,
        Method::POST,
        "/friends/requests",
        Some(&alice),
        Some(json!({ "to_user": bob_id })),
    )
    .await;
    let (status, second) = call(
        &h.app,
        Method::POST,
        "/friends/requests",
        Some(&bob),
        Some(json!({ "to_user": alice_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["auto_accepted"], true);
    assert_eq!(second["status"], "accepted");
    assert_eq!(second["request_id"], first["request_id"]);

    let (_, sent) = call(&h.app, Method::GET, "/friends/requests/sent", Some(&alice), None).await;
    assert!(sent.as_array().unwrap().is_empty());
    let (_, status_body) = call(&h.app, Method::GET, &format!("/friends/{alice_id}/status"), Some(&bob), None).await;
    assert_eq!(status_body["relationship"], "friend");
}

#[tokio::test]
async fn reject_then_cancel() {
    let h = harness();
    let (alice, _) = login(&h.app, "alice").await;
    let (bob, bob_id) = login(&h.app, "bob").await;
    let request = |token: String| {
        let app = h.app.clone();
        let bob_id = bob_id.clone();
        async move {
            call(&app, Method::POST, "/friends/requests", Some(&token), Some(json!({ "to_user": bob_id }))).await
        }
    };

    let (_, sent) = request(alice.clone()).await;
    let id = sent["request_id"].as_str().unwrap().to_string();
    let (status, rejected) = call(&h.app, Method::POST, &format!("/friends/requests/{id}/reject"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (status, again) = request(alice.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = again["request_id"].as_str().unwrap().to_string();

    let cancel = format!("/friends/requests/{id}/cancel");
    let (status, _) = call(&h.app, Method::POST, &cancel, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, cancelled) = call(&h.app, Method::POST, &cancel, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (_, received) = call(&h.app, Method::GET, "/friends/requests/received", Some(&bob), None).await;
    assert!(received.as_array().unwrap().is_empty());
}
