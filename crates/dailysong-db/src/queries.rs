use crate::Database;
use crate::models::{USER_COLUMNS, user_at};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use dailysong_core::streak::Streak;
use dailysong_types::models::{ExternalProfile, User};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

impl Database {
    // -- Users --

    /// Creates the user on first login, refreshes the profile afterwards.
    /// Streak fields are never touched here.
    pub fn upsert_user(&self, profile: &ExternalProfile) -> Result<User> {
        let now = self.clock().now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, external_id, display_name, profile_image_url, country, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT(external_id) DO UPDATE SET
                     display_name = excluded.display_name,
                     profile_image_url = excluded.profile_image_url,
                     country = excluded.country,
                     updated_at = excluded.updated_at",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    profile.external_id,
                    profile.display_name,
                    profile.profile_image_url,
                    profile.country,
                    now,
                ],
            )?;

            let user = query_user_by_external_id(conn, &profile.external_id)?
                .ok_or_else(|| anyhow::anyhow!("User vanished after upsert: {}", profile.external_id))?;
            debug!("Upserted user {} ({})", user.id, user.external_id);
            Ok(user)
        })
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    // -- Streaks --

    /// Recomputes one user's streak from their full post history.
    /// Returns `None` for an unknown user.
    pub fn rebuild_streak(&self, user_id: Uuid) -> Result<Option<Streak>> {
        let now = self.clock().now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            if query_user(&tx, user_id)?.is_none() {
                return Ok(None);
            }

            let streak = Streak::rebuild_from_history(post_dates(&tx, user_id)?);
            write_streak(&tx, user_id, &streak, now)?;
            tx.commit()?;

            debug!(
                "Rebuilt streak for {}: current={} longest={}",
                user_id, streak.current, streak.longest
            );
            Ok(Some(streak))
        })
    }

    /// Recomputes every user's streak. Returns how many users were updated.
    pub fn rebuild_all_streaks(&self) -> Result<usize> {
        let now = self.clock().now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

            let ids: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM users ORDER BY created_at")?;
                let ids = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                ids
            };

            for id in &ids {
                let user_id: Uuid = id.parse()?;
                let streak = Streak::rebuild_from_history(post_dates(&tx, user_id)?);
                write_streak(&tx, user_id, &streak, now)?;
            }
            tx.commit()?;

            info!("Rebuilt streaks for {} users", ids.len());
            Ok(ids.len())
        })
    }
}

pub(crate) fn query_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
    let user = conn
        .query_row(&sql, [id.to_string()], |row| user_at(row, 0))
        .optional()?;
    Ok(user)
}

fn query_user_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.external_id = ?1");
    let user = conn
        .query_row(&sql, [external_id], |row| user_at(row, 0))
        .optional()?;
    Ok(user)
}

/// All posted dates of a user, oldest first.
pub(crate) fn post_dates(conn: &Connection, user_id: Uuid) -> rusqlite::Result<Vec<NaiveDate>> {
    let mut stmt =
        conn.prepare("SELECT posted_date FROM song_posts WHERE user_id = ?1 ORDER BY posted_date")?;
    let dates = stmt
        .query_map([user_id.to_string()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(dates)
}

pub(crate) fn write_streak(
    conn: &Connection,
    user_id: Uuid,
    streak: &Streak,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET current_streak = ?2, longest_streak = ?3, last_post_date = ?4, updated_at = ?5
         WHERE id = ?1",
        rusqlite::params![
            user_id.to_string(),
            streak.current,
            streak.longest,
            streak.last_post_date,
            now,
        ],
    )?;
    Ok(())
}
