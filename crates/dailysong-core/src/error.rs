use thiserror::Error;

/// Rule violations reported by the core. All of them are recoverable by the
/// caller: fix the input or authenticate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SocialError {
    #[error("cannot send a friend request to yourself")]
    SelfRequest,

    #[error("a friend request is already pending")]
    AlreadyPending,

    #[error("already friends")]
    AlreadyFriends,

    /// Also returned when the record exists but the caller may not act on it,
    /// so non-recipients cannot probe for requests.
    #[error("not found")]
    NotFound,

    #[error("not friends")]
    NotFriends,

    #[error("a song was already posted today")]
    AlreadyPosted,

    #[error("missing, invalid or expired session token")]
    Unauthenticated,
}
