use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use dailysong_api::identity::SpotifyIdentity;
use dailysong_api::{AppState, AppStateInner, routes};
use dailysong_core::session::SessionStore;
use dailysong_core::{Clock, SystemClock};
use dailysong_db::Database;
use dailysong_server::cleanup;
use dailysong_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dailysong_server::init();

    let config = Config::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let db = Arc::new(Database::open(&config.db_path, clock.clone())?);
    let sessions = Arc::new(SessionStore::new(clock.clone(), config.session_ttl));
    let identity = Arc::new(SpotifyIdentity::new(
        config.spotify_client_id,
        config.spotify_client_secret,
        config.spotify_redirect_uri,
    ));

    if config.session_sweep_secs > 0 {
        tokio::spawn(cleanup::run_session_sweep(
            sessions.clone(),
            config.session_sweep_secs,
        ));
    } else {
        warn!("Session sweep disabled, expired sessions are only dropped on use");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        sessions,
        identity,
        clock,
    });

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Dailysong server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
