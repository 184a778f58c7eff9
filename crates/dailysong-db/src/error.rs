use dailysong_core::SocialError;
use thiserror::Error;

/// Failure of a store operation that enforces social rules.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Social(#[from] SocialError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn social(&self) -> Option<SocialError> {
        match self {
            Self::Social(e) => Some(*e),
            _ => None,
        }
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
