use chrono::{DateTime, Utc};
use dailysong_core::SocialError;
use dailysong_core::friendship::{self, Response, SendPlan};
use dailysong_types::models::{FriendRequest, Relationship, RequestStatus, User};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{REQUEST_COLUMNS, REQUEST_COLUMN_COUNT, USER_COLUMNS, request_at, user_at};
use crate::queries::query_user;

/// Result of `send_request`.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// The new pending request, or the recipient's request that was accepted.
    pub request: FriendRequest,
    pub auto_accepted: bool,
}

impl Database {
    /// Sends a friend request from `from` to `to`.
    ///
    /// If `to` already has a pending request towards `from`, that request is
    /// accepted instead and nothing new is stored.
    pub fn send_request(&self, from: Uuid, to: Uuid) -> Result<SendOutcome, StoreError> {
        let now = self.clock().now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if from != to && query_user(&tx, to)?.is_none() {
                return Err(SocialError::NotFound.into());
            }

            let forward = query_request_between(&tx, from, to)?;
            let reverse = query_request_between(&tx, to, from)?;
            let plan = friendship::plan_send(from, to, forward.as_ref(), reverse.as_ref())?;

            if let Some(stale) = plan.superseded() {
                tx.execute("DELETE FROM friend_requests WHERE id = ?1", [stale.to_string()])?;
                debug!("Dropped superseded request {} ({} -> {})", stale, from, to);
            }

            let outcome = match plan {
                SendPlan::Create { .. } => {
                    let request = FriendRequest {
                        id: Uuid::new_v4(),
                        from_user: from,
                        to_user: to,
                        status: RequestStatus::Pending,
                        created_at: now,
                        updated_at: now,
                    };
                    tx.execute(
                        "INSERT INTO friend_requests (id, from_user, to_user, status, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        rusqlite::params![
                            request.id.to_string(),
                            from.to_string(),
                            to.to_string(),
                            request.status.as_str(),
                            now,
                        ],
                    )?;
                    info!("Friend request {} sent: {} -> {}", request.id, from, to);
                    SendOutcome { request, auto_accepted: false }
                }
                SendPlan::AcceptReverse { reverse, .. } => {
                    let request = set_status(&tx, reverse, RequestStatus::Accepted, now)?;
                    info!("Mutual requests between {} and {} collapsed into friendship", from, to);
                    SendOutcome { request, auto_accepted: true }
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Accepts, rejects or cancels a pending request on behalf of
    /// `acting_user`. Anything the user may not act on is `NotFound`.
    pub fn respond_to_request(
        &self,
        request_id: Uuid,
        acting_user: Uuid,
        response: Response,
    ) -> Result<FriendRequest, StoreError> {
        let now = self.clock().now();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let request = query_request(&tx, request_id)?;
            let status = friendship::check_response(request.as_ref(), acting_user, response)?;
            let updated = set_status(&tx, request_id, status, now)?;
            tx.commit()?;

            info!("Friend request {} {} by {}", request_id, status, acting_user);
            Ok(updated)
        })
    }

    pub fn accept_request(&self, request_id: Uuid, acting_user: Uuid) -> Result<FriendRequest, StoreError> {
        self.respond_to_request(request_id, acting_user, Response::Accept)
    }

    pub fn reject_request(&self, request_id: Uuid, acting_user: Uuid) -> Result<FriendRequest, StoreError> {
        self.respond_to_request(request_id, acting_user, Response::Reject)
    }

    pub fn cancel_request(&self, request_id: Uuid, acting_user: Uuid) -> Result<FriendRequest, StoreError> {
        self.respond_to_request(request_id, acting_user, Response::Cancel)
    }

    /// Ends a friendship, deleting every record between the two users.
    /// Returns how many records were removed.
    pub fn remove_friendship(&self, user: Uuid, other: Uuid) -> Result<usize, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let records = query_records_between(&tx, user, other)?;
            friendship::check_removal(&records)?;

            let removed = tx.execute(
                "DELETE FROM friend_requests
                 WHERE (from_user = ?1 AND to_user = ?2) OR (from_user = ?2 AND to_user = ?1)",
                rusqlite::params![user.to_string(), other.to_string()],
            )?;
            tx.commit()?;

            info!("Friendship between {} and {} removed ({} records)", user, other, removed);
            Ok(removed)
        })
    }

    pub fn relationship(&self, user: Uuid, other: Uuid) -> anyhow::Result<Relationship> {
        self.with_conn(|conn| {
            let records = query_records_between(conn, user, other)?;
            Ok(friendship::relationship(user, other, &records))
        })
    }

    pub fn are_friends(&self, user: Uuid, other: Uuid) -> anyhow::Result<bool> {
        Ok(self.relationship(user, other)? == Relationship::Friend)
    }

    pub fn get_request(&self, request_id: Uuid) -> anyhow::Result<Option<FriendRequest>> {
        self.with_conn(|conn| Ok(query_request(conn, request_id)?))
    }

    /// Everyone `user` is friends with, whichever side sent the request.
    pub fn list_friends(&self, user: Uuid) -> anyhow::Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM friend_requests f
                 JOIN users u
                   ON u.id = CASE WHEN f.from_user = ?1 THEN f.to_user ELSE f.from_user END
                 WHERE (f.from_user = ?1 OR f.to_user = ?1) AND f.status = 'accepted'
                 ORDER BY u.display_name COLLATE NOCASE, u.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user.to_string()], |row| user_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Pending requests addressed to `user`, each with its sender.
    pub fn list_pending_received(&self, user: Uuid) -> anyhow::Result<Vec<(FriendRequest, User)>> {
        self.with_conn(|conn| query_pending(conn, user, PendingSide::Received))
    }

    /// Pending requests `user` sent, each with its recipient.
    pub fn list_pending_sent(&self, user: Uuid) -> anyhow::Result<Vec<(FriendRequest, User)>> {
        self.with_conn(|conn| query_pending(conn, user, PendingSide::Sent))
    }
}

#[derive(Clone, Copy)]
enum PendingSide {
    Received,
    Sent,
}

fn query_pending(
    conn: &Connection,
    user: Uuid,
    side: PendingSide,
) -> anyhow::Result<Vec<(FriendRequest, User)>> {
    let (mine, theirs) = match side {
        PendingSide::Received => ("f.to_user", "f.from_user"),
        PendingSide::Sent => ("f.from_user", "f.to_user"),
    };
    let sql = format!(
        "SELECT {REQUEST_COLUMNS}, {USER_COLUMNS} FROM friend_requests f
         JOIN users u ON u.id = {theirs}
         WHERE {mine} = ?1 AND f.status = 'pending'
         ORDER BY f.created_at DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user.to_string()], |row| {
            Ok((request_at(row, 0)?, user_at(row, REQUEST_COLUMN_COUNT)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_request(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<FriendRequest>> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM friend_requests f WHERE f.id = ?1");
    conn.query_row(&sql, [id.to_string()], |row| request_at(row, 0))
        .optional()
}

fn query_request_between(conn: &Connection, from: Uuid, to: Uuid) -> rusqlite::Result<Option<FriendRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests f WHERE f.from_user = ?1 AND f.to_user = ?2"
    );
    conn.query_row(&sql, [from.to_string(), to.to_string()], |row| request_at(row, 0))
        .optional()
}

fn query_records_between(conn: &Connection, a: Uuid, b: Uuid) -> rusqlite::Result<Vec<FriendRequest>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests f
         WHERE (f.from_user = ?1 AND f.to_user = ?2) OR (f.from_user = ?2 AND f.to_user = ?1)"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([a.to_string(), b.to_string()], |row| request_at(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn set_status(
    conn: &Connection,
    id: Uuid,
    status: RequestStatus,
    now: DateTime<Utc>,
) -> Result<FriendRequest, StoreError> {
    conn.execute(
        "UPDATE friend_requests SET status = ?2, updated_at = ?3 WHERE id = ?1",
        rusqlite::params![id.to_string(), status.as_str(), now],
    )?;
    query_request(conn, id)?
        .ok_or_else(|| anyhow::anyhow!("Friend request {} vanished during update", id).into())
}
