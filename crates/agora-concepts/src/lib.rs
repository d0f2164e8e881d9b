//! Concept layer: independent state machines over the shared document store.
//!
//! Each concept owns exactly one collection and never calls another concept.
//! Composition (a new group needs a fresh word list, a signup needs a points
//! account) belongs to the caller.
//!
//! Every read-modify-write runs inside [`agora_db::Database::transaction`] and writes
//! back through the version check in [`agora_db::Collection::replace`], so concurrent
//! requests against one entity cannot lose updates.

pub mod category;
pub mod censored_word_list;
pub mod friend;
pub mod group;
pub mod points;
pub mod vote;

pub use category::CategoryConcept;
pub use censored_word_list::CensoredWordListConcept;
pub use friend::FriendConcept;
pub use group::{GroupConcept, Invited};
pub use points::{InitialPoints, PointsConcept, Transfer};
pub use vote::{NewVote, VoteConcept, VoteOutcome};

use agora_db::{Collection, Connection, Doc};
use agora_types::{ConceptError, Result};
use anyhow::anyhow;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Persist `doc` or fail if it changed since it was read.
pub(crate) fn write_back<T>(collection: &Collection<T>, conn: &Connection, doc: &mut Doc<T>) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    if collection.replace(conn, doc)? {
        Ok(())
    } else {
        Err(ConceptError::Store(anyhow!(
            "{} document {} was modified concurrently",
            collection.name(),
            doc.id
        )))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use agora_db::Database;

    pub fn db() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }
}
