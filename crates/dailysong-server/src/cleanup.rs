use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use dailysong_core::session::SessionStore;

/// Background task that drops expired sessions.
///
/// Expired tokens are already refused on resolve; this only keeps tokens
/// that are never presented again from piling up in memory.
pub async fn run_session_sweep(sessions: Arc<SessionStore>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let count = sessions.purge_expired();
        if count > 0 {
            info!("Session sweep: pruned {} expired sessions", count);
        } else {
            debug!("Session sweep: {} live sessions", sessions.len());
        }
    }
}
