//! Friend request state machine.
//!
//! Records move `pending -> accepted | rejected | cancelled` and never leave a
//! terminal state. A rejected or cancelled record is deleted when the sender
//! asks again, and `remove` deletes every record between two users.
//!
//! The functions here only decide. The store loads the records for a pair,
//! calls into this module, and applies the plan inside one transaction.

use dailysong_types::models::{FriendRequest, Relationship, RequestStatus};
use uuid::Uuid;

use crate::error::SocialError;

/// What the store must do to honour `send_request(from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPlan {
    /// Insert a new pending `(from, to)` record, deleting `supersede` first.
    Create { supersede: Option<Uuid> },
    /// The recipient already asked us: promote their pending record to
    /// accepted. The forward request is never written.
    AcceptReverse { reverse: Uuid, supersede: Option<Uuid> },
}

impl SendPlan {
    pub fn superseded(&self) -> Option<Uuid> {
        match *self {
            Self::Create { supersede } | Self::AcceptReverse { supersede, .. } => supersede,
        }
    }
}

/// Decides `send_request(from, to)` given the current `(from, to)` record
/// and the `(to, from)` record, if any.
pub fn plan_send(
    from: Uuid,
    to: Uuid,
    forward: Option<&FriendRequest>,
    reverse: Option<&FriendRequest>,
) -> Result<SendPlan, SocialError> {
    if from == to {
        return Err(SocialError::SelfRequest);
    }
    debug_assert!(forward.is_none_or(|r| r.from_user == from && r.to_user == to));
    debug_assert!(reverse.is_none_or(|r| r.from_user == to && r.to_user == from));

    let mut supersede = None;
    if let Some(existing) = forward {
        if existing.status.is_superseded_by_resend() {
            supersede = Some(existing.id);
        } else if existing.status == RequestStatus::Accepted {
            return Err(SocialError::AlreadyFriends);
        } else {
            return Err(SocialError::AlreadyPending);
        }
    }

    match reverse.map(|r| (r.id, r.status)) {
        Some((_, RequestStatus::Accepted)) => Err(SocialError::AlreadyFriends),
        Some((id, RequestStatus::Pending)) => Ok(SendPlan::AcceptReverse { reverse: id, supersede }),
        _ => Ok(SendPlan::Create { supersede }),
    }
}

/// A decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Accept,
    Reject,
    /// Withdrawn by the sender.
    Cancel,
}

impl Response {
    pub fn resulting_status(self) -> RequestStatus {
        match self {
            Self::Accept => RequestStatus::Accepted,
            Self::Reject => RequestStatus::Rejected,
            Self::Cancel => RequestStatus::Cancelled,
        }
    }

    fn may_act(self, request: &FriendRequest, acting_user: Uuid) -> bool {
        match self {
            Self::Accept | Self::Reject => request.to_user == acting_user,
            Self::Cancel => request.from_user == acting_user,
        }
    }
}

/// Checks that `acting_user` may apply `response` to `request` and returns
/// the status to store. Missing, foreign and already-decided requests all
/// yield `NotFound`.
pub fn check_response(
    request: Option<&FriendRequest>,
    acting_user: Uuid,
    response: Response,
) -> Result<RequestStatus, SocialError> {
    match request {
        Some(r) if r.status == RequestStatus::Pending && response.may_act(r, acting_user) => {
            Ok(response.resulting_status())
        }
        _ => Err(SocialError::NotFound),
    }
}

/// `records` are all records between the two users, in either direction.
pub fn check_removal(records: &[FriendRequest]) -> Result<(), SocialError> {
    if records.iter().any(|r| r.status == RequestStatus::Accepted) {
        Ok(())
    } else {
        Err(SocialError::NotFriends)
    }
}

/// How `user` relates to `other`. Friendship wins over any stale pending
/// record, then an outgoing request, then an incoming one.
pub fn relationship(user: Uuid, other: Uuid, records: &[FriendRequest]) -> Relationship {
    let between = |r: &&FriendRequest| {
        (r.from_user == user && r.to_user == other) || (r.from_user == other && r.to_user == user)
    };
    let relevant: Vec<&FriendRequest> = records.iter().filter(between).collect();

    if relevant.iter().any(|r| r.status == RequestStatus::Accepted) {
        Relationship::Friend
    } else if relevant
        .iter()
        .any(|r| r.status == RequestStatus::Pending && r.from_user == user)
    {
        Relationship::RequestSent
    } else if relevant
        .iter()
        .any(|r| r.status == RequestStatus::Pending && r.from_user == other)
    {
        Relationship::RequestReceived
    } else {
        Relationship::None
    }
}
