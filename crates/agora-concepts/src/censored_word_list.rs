use std::sync::Arc;

use agora_db::{Collection, Connection, Database, Doc, Filter};
use agora_types::models::CensoredWordList;
use agora_types::{ConceptError, Id, Result};
use tracing::info;

use crate::write_back;

const LISTS: Collection<CensoredWordList> = Collection::new("censored_word_lists");

/// Word sets used for moderation. Entries are stored normalized: lowercase,
/// single-spaced, punctuation stripped. A phrase is allowed.
pub struct CensoredWordListConcept {
    db: Arc<Database>,
}

impl CensoredWordListConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self) -> Result<Doc<CensoredWordList>> {
        let list = self
            .db
            .with_conn(|conn| LISTS.create(conn, CensoredWordList::default()))?;

        info!(list = %list.id, "Censored word list created");
        Ok(list)
    }

    pub fn get_list(&self, id: Id) -> Result<Doc<CensoredWordList>> {
        self.db.transaction(|tx| load(tx, id))
    }

    pub fn delete(&self, id: Id) -> Result<()> {
        let removed = self.db.with_conn(|conn| LISTS.delete_one(conn, &Filter::id(id)))?;
        if !removed {
            return Err(not_found(id));
        }

        info!(list = %id, "Censored word list deleted");
        Ok(())
    }

    pub fn add_word(&self, id: Id, word: &str) -> Result<Doc<CensoredWordList>> {
        let word = normalize_word(word)?;

        self.db.transaction(|tx| {
            let mut list = load(tx, id)?;
            if list.words.insert(word.clone()) {
                write_back(&LISTS, tx, &mut list)?;
                info!(list = %id, %word, "Word censored");
            }
            Ok(list)
        })
    }

    pub fn delete_word(&self, id: Id, word: &str) -> Result<Doc<CensoredWordList>> {
        let word = normalize_word(word)?;

        self.db.transaction(|tx| {
            let mut list = load(tx, id)?;
            if list.words.remove(&word) {
                write_back(&LISTS, tx, &mut list)?;
                info!(list = %id, %word, "Word uncensored");
            }
            Ok(list)
        })
    }

    /// Entries of the list that occur in `text` as whole words or phrases,
    /// ignoring case and punctuation.
    pub fn find_censored(&self, id: Id, text: &str) -> Result<Vec<String>> {
        let list = self.get_list(id)?;
        let haystack = format!(" {} ", tokens(text).join(" "));

        Ok(list
            .words
            .iter()
            .filter(|word| haystack.contains(&format!(" {} ", word)))
            .cloned()
            .collect())
    }
}

fn load(conn: &Connection, id: Id) -> Result<Doc<CensoredWordList>> {
    LISTS
        .read_one(conn, &Filter::id(id))?
        .ok_or_else(|| not_found(id))
}

fn not_found(id: Id) -> ConceptError {
    ConceptError::not_found(format!("There exists no list with id {}", id))
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn normalize_word(word: &str) -> Result<String> {
    let normalized = tokens(word).join(" ");
    if normalized.is_empty() {
        return Err(ConceptError::invalid("Word must contain letters or digits"));
    }
    Ok(normalized)
}
