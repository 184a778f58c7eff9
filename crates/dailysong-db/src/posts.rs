use chrono::NaiveDate;
use dailysong_core::SocialError;
use dailysong_core::streak::{Streak, StreakStep};
use dailysong_types::models::{Song, SongPost};
use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::info;
use uuid::Uuid;

use crate::error::{StoreError, is_unique_violation};
use crate::models::{POST_COLUMNS, post};
use crate::queries::{query_user, write_streak};
use crate::Database;

impl Database {
    /// Stores a user's song for `posted_date` and advances their streak.
    ///
    /// Insert and streak update commit together. If the user already posted
    /// on that date the insert fails on `UNIQUE(user_id, posted_date)`, the
    /// transaction rolls back and the streak is left alone.
    pub fn create_post(
        &self,
        user_id: Uuid,
        posted_date: NaiveDate,
        song: &Song,
    ) -> Result<(SongPost, Streak), StoreError> {
        let now = self.clock().now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let user = query_user(&tx, user_id)?.ok_or(SocialError::NotFound)?;

            let post = SongPost {
                id: Uuid::new_v4(),
                user_id,
                posted_date,
                song: song.clone(),
                created_at: now,
            };

            let inserted = tx.execute(
                "INSERT INTO song_posts
                     (id, user_id, posted_date, song_name, artist_name, album_name, track_url, album_image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    post.id.to_string(),
                    user_id.to_string(),
                    posted_date,
                    song.song_name,
                    song.artist_name,
                    song.album_name,
                    song.track_url,
                    song.album_image_url,
                    now,
                ],
            );
            match inserted {
                Err(e) if is_unique_violation(&e) => return Err(SocialError::AlreadyPosted.into()),
                other => other?,
            };

            let mut streak = Streak::from(&user);
            let step = streak.record_post(posted_date);
            write_streak(&tx, user_id, &streak, now)?;
            tx.commit()?;

            match step {
                StreakStep::Reset => info!(
                    "User {} posted on {}, streak reset (longest {})",
                    user_id, posted_date, streak.longest
                ),
                _ => info!("User {} posted on {}, streak {}", user_id, posted_date, streak.current),
            }

            Ok((post, streak))
        })
    }

    /// A user's posts, newest first.
    pub fn list_posts(&self, user_id: Uuid, limit: u32) -> anyhow::Result<Vec<SongPost>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS} FROM song_posts p
                 WHERE p.user_id = ?1
                 ORDER BY p.posted_date DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_post_on(&self, user_id: Uuid, posted_date: NaiveDate) -> anyhow::Result<Option<SongPost>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_COLUMNS} FROM song_posts p WHERE p.user_id = ?1 AND p.posted_date = ?2"
            );
            let row = conn
                .query_row(&sql, rusqlite::params![user_id.to_string(), posted_date], post)
                .optional()?;
            Ok(row)
        })
    }
}
