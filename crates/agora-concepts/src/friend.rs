use std::sync::Arc;

use agora_db::{Collection, Database, Doc, Filter};
use agora_types::models::{FriendRequest, FriendStatus};
use agora_types::{ConceptError, Result, UserId};
use tracing::{debug, info};

use crate::write_back;

const REQUESTS: Collection<FriendRequest> = Collection::new("friend_requests");

/// Friendship as a request state machine: `pending` on send, `accepted` on
/// accept. Rejected and withdrawn requests are deleted, and two users are
/// friends while an accepted request exists between them in either direction.
pub struct FriendConcept {
    db: Arc<Database>,
}

impl FriendConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn send_request(&self, from: UserId, to: UserId) -> Result<Doc<FriendRequest>> {
        if from == to {
            return Err(ConceptError::invalid("Cannot send a friend request to yourself"));
        }

        self.db.transaction(|tx| {
            if REQUESTS.read_one(tx, &between(from, to, FriendStatus::Accepted))?.is_some() {
                return Err(ConceptError::duplicate(format!(
                    "{} and {} are already friends",
                    from, to
                )));
            }
            if REQUESTS.read_one(tx, &directed(from, to, FriendStatus::Pending))?.is_some() {
                return Err(ConceptError::duplicate(format!(
                    "A pending friend request from {} to {} already exists",
                    from, to
                )));
            }

            let request = REQUESTS.create(
                tx,
                FriendRequest {
                    from,
                    to,
                    status: FriendStatus::Pending,
                },
            )?;
            info!(%from, %to, "Friend request sent");
            Ok(request)
        })
    }

    pub fn accept_request(&self, from: UserId, to: UserId) -> Result<Doc<FriendRequest>> {
        self.db.transaction(|tx| {
            let mut request = REQUESTS
                .read_one(tx, &directed(from, to, FriendStatus::Pending))?
                .ok_or_else(|| no_pending(from, to))?;

            request.status = FriendStatus::Accepted;
            write_back(&REQUESTS, tx, &mut request)?;
            // A crossing request the other way is answered by this one.
            REQUESTS.delete_one(tx, &directed(to, from, FriendStatus::Pending))?;

            info!(%from, %to, "Friend request accepted");
            Ok(request)
        })
    }

    pub fn reject_request(&self, from: UserId, to: UserId) -> Result<()> {
        self.delete_pending(from, to)?;
        info!(%from, %to, "Friend request rejected");
        Ok(())
    }

    /// Sender withdraws a request that was never answered.
    pub fn remove_request(&self, from: UserId, to: UserId) -> Result<()> {
        self.delete_pending(from, to)?;
        info!(%from, %to, "Friend request withdrawn");
        Ok(())
    }

    pub fn remove_friend(&self, user: UserId, friend: UserId) -> Result<()> {
        let removed = self.db.with_conn(|conn| {
            REQUESTS.delete_one(conn, &between(user, friend, FriendStatus::Accepted))
        })?;
        if !removed {
            return Err(ConceptError::not_found(format!(
                "{} and {} are not friends",
                user, friend
            )));
        }

        info!(%user, %friend, "Friendship removed");
        Ok(())
    }

    pub fn get_friends(&self, user: UserId) -> Result<Vec<UserId>> {
        let accepted = self
            .db
            .with_conn(|conn| REQUESTS.read_many(conn, &involving(user, FriendStatus::Accepted)))?;

        debug!(%user, count = accepted.len(), "Loaded friends");
        Ok(accepted.iter().map(|r| r.counterpart(user)).collect())
    }

    /// Pending requests sent or received by `user`.
    pub fn get_requests(&self, user: UserId) -> Result<Vec<Doc<FriendRequest>>> {
        let pending = self
            .db
            .with_conn(|conn| REQUESTS.read_many(conn, &involving(user, FriendStatus::Pending)))?;
        Ok(pending)
    }

    pub fn are_friends(&self, a: UserId, b: UserId) -> Result<bool> {
        let found = self
            .db
            .with_conn(|conn| REQUESTS.read_one(conn, &between(a, b, FriendStatus::Accepted)))?;
        Ok(found.is_some())
    }

    fn delete_pending(&self, from: UserId, to: UserId) -> Result<()> {
        let removed = self.db.with_conn(|conn| {
            REQUESTS.delete_one(conn, &directed(from, to, FriendStatus::Pending))
        })?;
        if removed { Ok(()) } else { Err(no_pending(from, to)) }
    }
}

fn directed(from: UserId, to: UserId, status: FriendStatus) -> Filter {
    Filter::eq("from", from)
        .and(Filter::eq("to", to))
        .and(Filter::eq("status", status.as_str()))
}

fn between(a: UserId, b: UserId, status: FriendStatus) -> Filter {
    directed(a, b, status).or(directed(b, a, status))
}

fn involving(user: UserId, status: FriendStatus) -> Filter {
    Filter::eq("from", user)
        .or(Filter::eq("to", user))
        .and(Filter::eq("status", status.as_str()))
}

fn no_pending(from: UserId, to: UserId) -> ConceptError {
    ConceptError::not_found(format!("No pending friend request from {} to {}", from, to))
}
