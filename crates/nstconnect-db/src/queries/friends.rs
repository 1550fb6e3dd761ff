use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::Database;
use crate::models::{FriendRequestRow, IncomingRequestRow, UserSummaryRow};
use crate::queries::notifications::{NewNotification, insert_notification};
use crate::queries::summary_at;

/// What `accept_friend_request` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// Request accepted, friendship rows created, sender notified.
    Accepted,
    /// Request accepted; the two users were already friends.
    AlreadyFriends,
    /// The request was no longer pending when the transaction ran.
    NotPending,
}

impl Database {
    // -- Requests --

    /// Returns `None` when a pending request from `sender_id` to
    /// `receiver_id` already exists; the partial unique index enforces that
    /// even across concurrent senders.
    pub fn create_friend_request(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Option<FriendRequestRow>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO friend_requests (id, sender_id, receiver_id) VALUES (?1, ?2, ?3)",
                params![id, sender_id, receiver_id],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let row = query_request(conn, id)?
                .ok_or_else(|| anyhow::anyhow!("friend request {} vanished after insert", id))?;
            Ok(Some(row))
        })
    }

    pub fn get_friend_request(&self, id: &str) -> Result<Option<FriendRequestRow>> {
        self.with_conn(|conn| query_request(conn, id))
    }

    pub fn find_pending_request(&self, sender_id: &str, receiver_id: &str) -> Result<Option<FriendRequestRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, sender_id, receiver_id, status, created_at
                     FROM friend_requests
                     WHERE sender_id = ?1 AND receiver_id = ?2 AND status = 'PENDING'",
                    params![sender_id, receiver_id],
                    map_request,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Pending requests addressed to `receiver_id`, newest first, with sender cards.
    pub fn get_incoming_requests(&self, receiver_id: &str) -> Result<Vec<IncomingRequestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.sender_id, r.receiver_id, r.status, r.created_at,
                        u.id, u.name, u.profile_pic, u.headline, u.department
                 FROM friend_requests r
                 JOIN users u ON u.id = r.sender_id
                 WHERE r.receiver_id = ?1 AND r.status = 'PENDING'
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )?;
            let rows = stmt
                .query_map([receiver_id], |row| {
                    Ok(IncomingRequestRow {
                        request: map_request(row)?,
                        sender: summary_at(row, 5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Accepts a pending request in one transaction: the status flips to
    /// ACCEPTED, both friendship edges are inserted and the sender gets
    /// `notification`. Nothing is written unless the request is still pending.
    pub fn accept_friend_request(
        &self,
        request: &FriendRequestRow,
        notification: &NewNotification<'_>,
    ) -> Result<AcceptOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !mark_processed(&tx, &request.id, "ACCEPTED")? {
                return Ok(AcceptOutcome::NotPending);
            }

            if query_are_friends(&tx, &request.sender_id, &request.receiver_id)? {
                tx.commit()?;
                debug!("Request {} accepted; friendship already existed", request.id);
                return Ok(AcceptOutcome::AlreadyFriends);
            }

            insert_edge(&tx, &edge_id(&request.id, 0), &request.sender_id, &request.receiver_id)?;
            insert_edge(&tx, &edge_id(&request.id, 1), &request.receiver_id, &request.sender_id)?;
            insert_notification(&tx, notification)?;

            tx.commit()?;
            Ok(AcceptOutcome::Accepted)
        })
    }

    /// Returns false if the request was not pending.
    pub fn reject_friend_request(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| mark_processed(conn, id, "REJECTED"))
    }

    // -- Friendships --

    pub fn are_friends(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn(|conn| query_are_friends(conn, user_id, other_id))
    }

    /// Inserts both directions of a friendship. Existing edges are left alone.
    pub fn create_friendship(&self, user_id: &str, other_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO friends (id, user_id, friend_id) VALUES (?1, ?2, ?3)",
                params![format!("{}:{}", user_id, other_id), user_id, other_id],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO friends (id, user_id, friend_id) VALUES (?1, ?2, ?3)",
                params![format!("{}:{}", other_id, user_id), other_id, user_id],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_friends(&self, user_id: &str) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.profile_pic, u.headline, u.department
                 FROM friends f
                 JOIN users u ON u.id = f.friend_id
                 WHERE f.user_id = ?1
                 ORDER BY u.name",
            )?;
            let rows = stmt
                .query_map([user_id], |row| summary_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Removes both edges. Returns false when the users were not friends.
    pub fn remove_friendship(&self, user_id: &str, other_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM friends
                 WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
                params![user_id, other_id],
            )?;
            Ok(removed > 0)
        })
    }
}

/// Edge ids derive from the request id, one per direction.
fn edge_id(request_id: &str, direction: u8) -> String {
    format!("{}:{}", request_id, direction)
}

fn mark_processed(conn: &Connection, id: &str, status: &str) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE friend_requests SET status = ?2 WHERE id = ?1 AND status = 'PENDING'",
        params![id, status],
    )?;
    Ok(changed == 1)
}

fn insert_edge(conn: &Connection, id: &str, user_id: &str, friend_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO friends (id, user_id, friend_id) VALUES (?1, ?2, ?3)",
        params![id, user_id, friend_id],
    )?;
    Ok(())
}

fn query_are_friends(conn: &Connection, user_id: &str, other_id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM friends
             WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)
             LIMIT 1",
            params![user_id, other_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_request(conn: &Connection, id: &str) -> Result<Option<FriendRequestRow>> {
    let row = conn
        .query_row(
            "SELECT id, sender_id, receiver_id, status, created_at FROM friend_requests WHERE id = ?1",
            [id],
            map_request,
        )
        .optional()?;
    Ok(row)
}

fn map_request(row: &Row<'_>) -> rusqlite::Result<FriendRequestRow> {
    Ok(FriendRequestRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
    })
}
