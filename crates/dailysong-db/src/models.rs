//! Row decoding. Ids are stored as TEXT and parsed back into UUIDs here so
//! a corrupt row surfaces as a conversion error instead of a default id.

use dailysong_types::models::{FriendRequest, RequestStatus, Song, SongPost, User};
use rusqlite::Row;
use rusqlite::types::Type;
use tracing::warn;
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "u.id, u.external_id, u.display_name, u.profile_image_url, \
     u.country, u.current_streak, u.longest_streak, u.last_post_date, u.created_at, u.updated_at";

pub(crate) const REQUEST_COLUMNS: &str =
    "f.id, f.from_user, f.to_user, f.status, f.created_at, f.updated_at";
pub(crate) const REQUEST_COLUMN_COUNT: usize = 6;

pub(crate) const POST_COLUMNS: &str = "p.id, p.user_id, p.posted_date, p.song_name, p.artist_name, \
     p.album_name, p.track_url, p.album_image_url, p.created_at";

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        warn!("Corrupt id {:?} in column {}: {}", text, idx, e);
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

/// Reads `USER_COLUMNS` starting at column `offset`.
pub(crate) fn user_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, offset)?,
        external_id: row.get(offset + 1)?,
        display_name: row.get(offset + 2)?,
        profile_image_url: row.get(offset + 3)?,
        country: row.get(offset + 4)?,
        current_streak: row.get(offset + 5)?,
        longest_streak: row.get(offset + 6)?,
        last_post_date: row.get(offset + 7)?,
        created_at: row.get(offset + 8)?,
        updated_at: row.get(offset + 9)?,
    })
}

/// Reads `REQUEST_COLUMNS` starting at column `offset`.
pub(crate) fn request_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<FriendRequest> {
    let status_idx = offset + 3;
    let status: String = row.get(status_idx)?;
    let status = status.parse::<RequestStatus>().map_err(|e| {
        warn!("Corrupt friend request row: {}", e);
        rusqlite::Error::FromSqlConversionFailure(status_idx, Type::Text, e.into())
    })?;

    Ok(FriendRequest {
        id: uuid_at(row, offset)?,
        from_user: uuid_at(row, offset + 1)?,
        to_user: uuid_at(row, offset + 2)?,
        status,
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

pub(crate) fn post(row: &Row<'_>) -> rusqlite::Result<SongPost> {
    Ok(SongPost {
        id: uuid_at(row, 0)?,
        user_id: uuid_at(row, 1)?,
        posted_date: row.get(2)?,
        song: Song {
            song_name: row.get(3)?,
            artist_name: row.get(4)?,
            album_name: row.get(5)?,
            track_url: row.get(6)?,
            album_image_url: row.get(7)?,
        },
        created_at: row.get(8)?,
    })
}
