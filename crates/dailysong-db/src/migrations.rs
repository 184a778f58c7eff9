use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                  TEXT PRIMARY KEY,
                external_id         TEXT NOT NULL UNIQUE,
                display_name        TEXT,
                profile_image_url   TEXT,
                country             TEXT,
                current_streak      INTEGER NOT NULL DEFAULT 0,
                longest_streak      INTEGER NOT NULL DEFAULT 0,
                last_post_date      TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE song_posts (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                posted_date     TEXT NOT NULL,
                song_name       TEXT NOT NULL,
                artist_name     TEXT NOT NULL,
                album_name      TEXT,
                track_url       TEXT,
                album_image_url TEXT,
                created_at      TEXT NOT NULL,
                UNIQUE(user_id, posted_date)
            );

            CREATE TABLE friend_requests (
                id          TEXT PRIMARY KEY,
                from_user   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                to_user     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                status      TEXT NOT NULL
                    CHECK (status IN ('pending', 'accepted', 'rejected', 'cancelled')),
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                UNIQUE(from_user, to_user),
                CHECK (from_user <> to_user)
            );

            CREATE INDEX idx_friend_requests_to
                ON friend_requests(to_user, status);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
