use std::collections::BTreeSet;
use std::sync::Arc;

use agora_db::{Collection, Connection, Database, Doc, Filter};
use agora_types::models::{Vote, VoteStatus, VoteType};
use agora_types::{ConceptError, Id, Result, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::write_back;

const VOTES: Collection<Vote> = Collection::new("votes");

#[derive(Debug, Clone)]
pub struct NewVote {
    pub scope: Id,
    pub title: String,
    pub reason: String,
    pub vote_type: VoteType,
    pub electorate: BTreeSet<UserId>,
    /// Defaults to the creation time.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
}

/// What a check saw. For `Approved` and `Expired` the vote is already gone
/// from the store and `vote` is its final tally.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub status: VoteStatus,
    pub vote: Doc<Vote>,
}

/// Time-boxed yes/no votes over a fixed electorate.
///
/// Nothing runs in the background: a vote is only resolved when someone
/// checks it.
pub struct VoteConcept {
    db: Arc<Database>,
}

impl VoteConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_vote(&self, new: NewVote, now: DateTime<Utc>) -> Result<Doc<Vote>> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ConceptError::invalid("Vote title must be non-empty"));
        }
        let start_time = new.start_time.unwrap_or(now);
        if new.end_time <= start_time {
            return Err(ConceptError::invalid("Vote must end after it starts"));
        }

        let vote = Vote {
            scope: new.scope,
            title: title.to_string(),
            reason: new.reason,
            vote_type: new.vote_type,
            electorate: new.electorate,
            yes_voters: BTreeSet::new(),
            start_time,
            end_time: new.end_time,
        };
        let vote = self.db.with_conn(|conn| VOTES.create(conn, vote))?;

        info!(
            vote = %vote.id,
            scope = %vote.scope,
            kind = ?vote.vote_type,
            electorate = vote.electorate.len(),
            "Vote opened"
        );
        Ok(vote)
    }

    pub fn get_vote(&self, id: Id) -> Result<Doc<Vote>> {
        self.db.transaction(|tx| load(tx, id))
    }

    /// Unresolved votes in `scope`. Votes past their end time stay listed
    /// until someone checks them.
    pub fn get_all_votes(&self, scope: Id) -> Result<Vec<Doc<Vote>>> {
        Ok(self
            .db
            .with_conn(|conn| VOTES.read_many(conn, &Filter::eq("scope", scope)))?)
    }

    /// Record a yes from `user`. Voting yes twice changes nothing. A yes cast
    /// after `end_time` is still recorded, but the vote resolves as expired.
    pub fn vote_yes(&self, id: Id, user: UserId) -> Result<Doc<Vote>> {
        self.db.transaction(|tx| {
            let mut vote = load(tx, id)?;

            if !vote.electorate.contains(&user) {
                return Err(ConceptError::not_allowed(format!(
                    "{} is not in the electorate of vote {}",
                    user, id
                )));
            }
            if vote.yes_voters.insert(user) {
                write_back(&VOTES, tx, &mut vote)?;
                info!(vote = %id, %user, yes = vote.yes_voters.len(), "Voted yes");
            }
            Ok(vote)
        })
    }

    /// Resolve lazily: expired first, then the approval threshold, otherwise
    /// still pending. Resolved votes are deleted.
    pub fn check_vote(&self, id: Id, now: DateTime<Utc>) -> Result<VoteOutcome> {
        self.db.transaction(|tx| {
            let vote = load(tx, id)?;
            let status = vote.status_at(now);

            if status != VoteStatus::Pending {
                VOTES.delete_one(tx, &Filter::id(id))?;
                info!(
                    vote = %id,
                    ?status,
                    yes = vote.yes_voters.len(),
                    electorate = vote.electorate.len(),
                    "Vote resolved"
                );
            }
            Ok(VoteOutcome { status, vote })
        })
    }
}

fn load(conn: &Connection, id: Id) -> Result<Doc<Vote>> {
    VOTES
        .read_one(conn, &Filter::id(id))?
        .ok_or_else(|| ConceptError::not_found(format!("Vote {} not found", id)))
}
