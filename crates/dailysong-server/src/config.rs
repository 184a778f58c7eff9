use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use tracing::info;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_ttl: Duration,
    /// Seconds between expired-session sweeps; 0 turns the sweep off.
    pub session_sweep_secs: u64,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_hours: i64 = try_load(&lookup, "DAILYSONG_SESSION_TTL_HOURS", "24")?;
        if ttl_hours <= 0 {
            return Err(anyhow!("DAILYSONG_SESSION_TTL_HOURS must be positive"));
        }

        Ok(Self {
            host: load(&lookup, "DAILYSONG_HOST", "0.0.0.0"),
            port: try_load(&lookup, "DAILYSONG_PORT", "3000")?,
            db_path: load(&lookup, "DAILYSONG_DB_PATH", "dailysong.db").into(),
            session_ttl: Duration::hours(ttl_hours),
            session_sweep_secs: try_load(&lookup, "DAILYSONG_SESSION_SWEEP_SECS", "3600")?,
            spotify_client_id: required(&lookup, "SPOTIFY_CLIENT_ID")?,
            spotify_client_secret: required(&lookup, "SPOTIFY_CLIENT_SECRET")?,
            spotify_redirect_uri: load(
                &lookup,
                "SPOTIFY_REDIRECT_URI",
                "http://127.0.0.1:3000/auth/callback",
            ),
        })
    }

    /// Only the database location, for tools that never serve HTTP.
    pub fn db_path_from_env() -> PathBuf {
        load(&|key: &str| std::env::var(key).ok(), "DAILYSONG_DB_PATH", "dailysong.db").into()
    }
}

fn load<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    load(lookup, key, default)
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} must be set"))
}
