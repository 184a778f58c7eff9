use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Identifier issued by the music service (Spotify user id).
    pub external_id: String,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub country: Option<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_post_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile handed over by the identity provider after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub external_id: String,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub country: Option<String>,
}

/// The part of a user that friends and request counterparts get to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub song_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub track_url: Option<String>,
    pub album_image_url: Option<String>,
}

/// A user's song of the day. At most one exists per user and calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongPost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub posted_date: NaiveDate,
    #[serde(flatten)]
    pub song: Song,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Rejected and cancelled records may be replaced by a fresh request.
    pub fn is_superseded_by_resend(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

/// A directed friendship request. An accepted request is the friendship
/// itself, regardless of which side sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn involves(&self, user: Uuid) -> bool {
        self.from_user == user || self.to_user == user
    }
}

/// How `user` relates to `other`, as seen from `user`'s side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Friend,
    RequestSent,
    RequestReceived,
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_its_own_text() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert!("declined".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn relationship_serializes_snake_case() {
        let json = serde_json::to_string(&Relationship::RequestReceived).unwrap();
        assert_eq!(json, "\"request_received\"");
    }

    #[test]
    fn post_flattens_song_fields() {
        let post = SongPost {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            posted_date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            song: Song {
                song_name: "Always".into(),
                artist_name: "Daniel Caesar".into(),
                album_name: Some("NEVER ENOUGH".into()),
                track_url: None,
                album_image_url: None,
            },
            created_at: DateTime::default(),
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["song_name"], "Always");
        assert_eq!(value["posted_date"], "2024-01-06");
    }
}
