pub mod collection;
pub mod filter;
pub mod migrations;
pub mod models;

pub use collection::Collection;
pub use filter::Filter;
pub use models::Doc;
pub use rusqlite::{Connection, Transaction};

use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Single-writer document database. Every concept collection lives in the
/// same SQLite file; the mutex serializes all access to it.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private, throwaway database. Used by tests and local experiments.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    /// Run `f` inside one transaction while holding the connection lock.
    /// Commits on `Ok`; any `Err` drops the transaction, which rolls it back.
    pub fn transaction<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> std::result::Result<T, E>,
        E: From<anyhow::Error>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn.transaction().map_err(anyhow::Error::from)?;

        let out = f(&tx)?;

        tx.commit().map_err(anyhow::Error::from)?;
        Ok(out)
    }
}
