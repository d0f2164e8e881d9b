use std::sync::Arc;

use agora_db::{Collection, Connection, Database, Doc, Filter};
use agora_types::models::Category;
use agora_types::{ConceptError, Id, Result};
use tracing::info;

use crate::write_back;

const CATEGORIES: Collection<Category> = Collection::new("categories");

/// Labelled sets of opaque references. Labels are unique across the store.
pub struct CategoryConcept {
    db: Arc<Database>,
}

impl CategoryConcept {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create_category(&self, label: &str, items: impl IntoIterator<Item = Id>) -> Result<Doc<Category>> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ConceptError::invalid("Label must be non-empty"));
        }

        let category = Category {
            label: label.to_string(),
            items: items.into_iter().collect(),
        };

        self.db.transaction(|tx| {
            if CATEGORIES.read_one(tx, &Filter::eq("label", label))?.is_some() {
                return Err(ConceptError::duplicate(format!(
                    "Category with label {} already exists",
                    label
                )));
            }

            let category = CATEGORIES.create(tx, category)?;
            info!(category = %category.id, label, "Category created");
            Ok(category)
        })
    }

    pub fn get_category(&self, id: Id) -> Result<Doc<Category>> {
        self.db.transaction(|tx| load(tx, id))
    }

    pub fn get_by_label(&self, label: &str) -> Result<Doc<Category>> {
        self.db
            .with_conn(|conn| CATEGORIES.read_one(conn, &Filter::eq("label", label.trim())))?
            .ok_or_else(|| ConceptError::not_found(format!("No category labelled {}", label)))
    }

    pub fn delete_category(&self, id: Id) -> Result<()> {
        let removed = self
            .db
            .with_conn(|conn| CATEGORIES.delete_one(conn, &Filter::id(id)))?;
        if !removed {
            return Err(not_found(id));
        }

        info!(category = %id, "Category deleted");
        Ok(())
    }

    pub fn add_element(&self, id: Id, item: Id) -> Result<Doc<Category>> {
        self.db.transaction(|tx| {
            let mut category = load(tx, id)?;
            if category.items.insert(item) {
                write_back(&CATEGORIES, tx, &mut category)?;
            }
            Ok(category)
        })
    }

    pub fn delete_element(&self, id: Id, item: Id) -> Result<Doc<Category>> {
        self.db.transaction(|tx| {
            let mut category = load(tx, id)?;
            if category.items.remove(&item) {
                write_back(&CATEGORIES, tx, &mut category)?;
            }
            Ok(category)
        })
    }
}

fn load(conn: &Connection, id: Id) -> Result<Doc<Category>> {
    CATEGORIES
        .read_one(conn, &Filter::id(id))?
        .ok_or_else(|| not_found(id))
}

fn not_found(id: Id) -> ConceptError {
    ConceptError::not_found(format!("Category {} not found", id))
}
