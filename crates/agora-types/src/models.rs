//! Concept document bodies. The store wraps each of these with an id,
//! timestamps and a version; nothing here knows about persistence.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{Id, PostId, UserId};

/// Share of the electorate (in percent) needed to approve a vote.
pub const APPROVAL_PERCENT: usize = 51;

// -- Friends --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
}

impl FriendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub from: UserId,
    pub to: UserId,
    pub status: FriendStatus,
}

impl FriendRequest {
    /// The other side of the request, seen from `user`.
    pub fn counterpart(&self, user: UserId) -> UserId {
        if self.from == user { self.to } else { self.from }
    }
}

// -- Groups --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub owner: UserId,
    /// Insertion-ordered, duplicate free, always contains `owner`.
    pub residents: Vec<UserId>,
    pub private: bool,
    pub censored_word_list: Id,
    pub posts: Vec<PostId>,
}

impl Group {
    pub fn new(owner: UserId, private: bool, censored_word_list: Id) -> Self {
        Self {
            owner,
            residents: vec![owner],
            private,
            censored_word_list,
            posts: Vec::new(),
        }
    }

    pub fn is_resident(&self, user: UserId) -> bool {
        self.residents.contains(&user)
    }
}

// -- Points --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAccount {
    pub user: UserId,
    pub balance: i64,
    pub streak: u32,
}

// -- Votes --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Ban,
    Censor,
    Uncensor,
    Delete,
}

/// Reported by a vote check. Terminal states are never stored: a resolved
/// vote is deleted and its final tally handed back once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteStatus {
    Pending,
    Approved,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub scope: Id,
    pub title: String,
    pub reason: String,
    pub vote_type: VoteType,
    pub electorate: BTreeSet<UserId>,
    /// Always a subset of `electorate`.
    pub yes_voters: BTreeSet<UserId>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Vote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time
    }

    /// Integer form of `yes / electorate >= 0.51`. An empty electorate never
    /// reaches the threshold.
    pub fn approval_reached(&self) -> bool {
        let total = self.electorate.len();
        total > 0 && self.yes_voters.len() * 100 >= APPROVAL_PERCENT * total
    }

    /// Expiry wins over approval so a late check is deterministic.
    pub fn status_at(&self, now: DateTime<Utc>) -> VoteStatus {
        if self.is_expired(now) {
            VoteStatus::Expired
        } else if self.approval_reached() {
            VoteStatus::Approved
        } else {
            VoteStatus::Pending
        }
    }
}

// -- Moderation --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub items: BTreeSet<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensoredWordList {
    pub words: BTreeSet<String>,
}
