use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FriendRequest, Relationship, RequestStatus, Song, SongPost, User, UserSummary};

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginUrlResponse {
    pub authorization_url: String,
}

/// Query string the music service appends when redirecting back.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub song_name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub track_url: Option<String>,
    #[serde(default)]
    pub album_image_url: Option<String>,
}

impl CreatePostRequest {
    pub fn into_song(self) -> Song {
        Song {
            song_name: self.song_name.trim().to_string(),
            artist_name: self.artist_name.trim().to_string(),
            album_name: self.album_name,
            track_url: self.track_url,
            album_image_url: self.album_image_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_post_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostResponse {
    pub post: SongPost,
    pub streak: StreakResponse,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendFriendRequest {
    pub to_user: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendFriendResponse {
    pub request_id: Uuid,
    pub status: RequestStatus,
    /// True when the recipient had already asked us and the two requests
    /// collapsed into a friendship.
    pub auto_accepted: bool,
}

/// A pending request together with the user on the other end of it.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingRequestResponse {
    pub request: FriendRequest,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelationshipResponse {
    pub user_id: Uuid,
    pub relationship: Relationship,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
