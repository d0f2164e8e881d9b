use std::ops::{Deref, DerefMut};

use agora_types::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document: the store-owned envelope around a concept body.
///
/// `version` starts at 1 and is bumped by every write. Writing back a `Doc`
/// through [`Collection::replace`](crate::Collection::replace) only succeeds
/// while the stored version still matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc<T> {
    pub id: Id,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
    #[serde(flatten)]
    pub fields: T,
}

impl<T> Doc<T> {
    pub fn into_fields(self) -> T {
        self.fields
    }
}

impl<T> Deref for Doc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.fields
    }
}

impl<T> DerefMut for Doc<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.fields
    }
}

/// Raw row as read from the `documents` table.
pub(crate) struct DocRow {
    pub id: String,
    pub body: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}
