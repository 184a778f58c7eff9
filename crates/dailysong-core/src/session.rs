use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;

/// Random bytes per token (256 bits).
const TOKEN_BYTES: usize = 32;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// In-memory bearer tokens. Created once at startup and shared through the
/// app state; nothing survives a restart.
///
/// Expired entries are evicted when they are next resolved. `purge_expired`
/// exists for a periodic sweep and does not change what `resolve` returns.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Starts a new session for `user_id`. Existing sessions stay valid.
    pub fn issue(&self, user_id: Uuid) -> IssuedToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = B64.encode(bytes);
        let expires_at = self.clock.now() + self.ttl;

        self.write().insert(token.clone(), Session { user_id, expires_at });
        debug!("Issued session for user {} (expires {})", user_id, expires_at);

        IssuedToken { token, expires_at }
    }

    /// Returns the user behind `token`, or `None` if it is unknown or
    /// expired. Expired tokens are removed. Expiry is never extended.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let now = self.clock.now();

        let session = *self.read().get(token)?;
        if now <= session.expires_at {
            return Some(session.user_id);
        }

        let mut sessions = self.write();
        // Another caller may have evicted it between the two locks.
        if sessions.get(token).is_some_and(|s| now > s.expires_at) {
            sessions.remove(token);
            debug!("Evicted expired session for user {}", session.user_id);
        }
        None
    }

    /// Forgets `token`. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        if let Some(session) = self.write().remove(token) {
            debug!("Revoked session for user {}", session.user_id);
        }
    }

    /// Drops every expired session and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| now <= s.expires_at);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a half-written entry,
    // so a poisoned map is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}
