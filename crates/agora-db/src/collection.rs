use std::marker::PhantomData;

use agora_types::Id;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::filter::{Filter, RESERVED_FIELDS};
use crate::models::{Doc, DocRow};

/// Typed handle to one logical collection inside the `documents` table.
///
/// Holds no connection: every call takes the `&Connection` (or transaction)
/// to run on, so several calls can be composed into one transaction.
pub struct Collection<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Collection<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn create(&self, conn: &Connection, fields: T) -> Result<Doc<T>> {
        let id = Id::new();
        let now = now();
        let body = serde_json::to_string(&fields)?;

        conn.execute(
            "INSERT INTO documents (collection, id, body, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            rusqlite::params![self.name, id.to_string(), body, timestamp(now)],
        )?;

        debug!(collection = self.name, %id, "document created");
        Ok(Doc {
            id,
            created_at: now,
            updated_at: now,
            version: 1,
            fields,
        })
    }

    /// Oldest document matching `filter`.
    pub fn read_one(&self, conn: &Connection, filter: &Filter) -> Result<Option<Doc<T>>> {
        let mut params = vec![SqlValue::Text(self.name.to_string())];
        let predicate = filter.to_sql(&mut params)?;
        let sql = format!(
            "SELECT id, body, version, created_at, updated_at FROM documents
             WHERE collection = ? AND ({})
             ORDER BY created_at, rowid
             LIMIT 1",
            predicate
        );

        let mut rows = query_rows(conn, &sql, params)?;
        rows.pop().map(|row| self.decode(row)).transpose()
    }

    /// All documents matching `filter`, in creation order.
    pub fn read_many(&self, conn: &Connection, filter: &Filter) -> Result<Vec<Doc<T>>> {
        let mut params = vec![SqlValue::Text(self.name.to_string())];
        let predicate = filter.to_sql(&mut params)?;
        let sql = format!(
            "SELECT id, body, version, created_at, updated_at FROM documents
             WHERE collection = ? AND ({})
             ORDER BY created_at, rowid",
            predicate
        );

        query_rows(conn, &sql, params)?
            .into_iter()
            .map(|row| self.decode(row))
            .collect()
    }

    /// Merge `patch` (a JSON object, RFC 7396 semantics) into the first
    /// document matching `filter`. Returns false when nothing matched.
    pub fn update_one(&self, conn: &Connection, filter: &Filter, patch: Value) -> Result<bool> {
        let Value::Object(map) = &patch else {
            bail!("Update patch must be a JSON object");
        };
        if let Some(key) = map.keys().find(|k| RESERVED_FIELDS.contains(&k.as_str())) {
            bail!("Field {:?} is managed by the store", key);
        }

        let mut params = vec![
            SqlValue::Text(patch.to_string()),
            SqlValue::Text(timestamp(now())),
            SqlValue::Text(self.name.to_string()),
            SqlValue::Text(self.name.to_string()),
        ];
        let predicate = filter.to_sql(&mut params)?;
        let sql = format!(
            "UPDATE documents
             SET body = json_patch(body, ?), version = version + 1, updated_at = ?
             WHERE collection = ? AND id = (
                 SELECT id FROM documents
                 WHERE collection = ? AND ({})
                 ORDER BY created_at, rowid
                 LIMIT 1
             )",
            predicate
        );

        let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(changed > 0)
    }

    /// Write `doc` back if its stored version is still `doc.version`.
    ///
    /// On success `doc` picks up the new version and `updated_at`. Returns
    /// false when the document was deleted or written by someone else since
    /// it was read.
    pub fn replace(&self, conn: &Connection, doc: &mut Doc<T>) -> Result<bool> {
        let now = now();
        let body = serde_json::to_string(&doc.fields)?;

        let changed = conn.execute(
            "UPDATE documents
             SET body = ?1, version = version + 1, updated_at = ?2
             WHERE collection = ?3 AND id = ?4 AND version = ?5",
            rusqlite::params![body, timestamp(now), self.name, doc.id.to_string(), doc.version],
        )?;

        if changed == 0 {
            return Ok(false);
        }
        doc.version += 1;
        doc.updated_at = now;
        Ok(true)
    }

    /// Delete the oldest document matching `filter`.
    pub fn delete_one(&self, conn: &Connection, filter: &Filter) -> Result<bool> {
        let mut params = vec![
            SqlValue::Text(self.name.to_string()),
            SqlValue::Text(self.name.to_string()),
        ];
        let predicate = filter.to_sql(&mut params)?;
        let sql = format!(
            "DELETE FROM documents
             WHERE collection = ? AND id = (
                 SELECT id FROM documents
                 WHERE collection = ? AND ({})
                 ORDER BY created_at, rowid
                 LIMIT 1
             )",
            predicate
        );

        let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(changed > 0)
    }

    pub fn delete_many(&self, conn: &Connection, filter: &Filter) -> Result<usize> {
        let mut params = vec![SqlValue::Text(self.name.to_string())];
        let predicate = filter.to_sql(&mut params)?;
        let sql = format!(
            "DELETE FROM documents WHERE collection = ? AND ({})",
            predicate
        );

        let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(changed)
    }

    fn decode(&self, row: DocRow) -> Result<Doc<T>> {
        let fields = serde_json::from_str(&row.body)
            .with_context(|| format!("Corrupt {} document {}", self.name, row.id))?;

        Ok(Doc {
            id: row
                .id
                .parse()
                .with_context(|| format!("Corrupt {} id '{}'", self.name, row.id))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            version: row.version,
            fields,
        })
    }
}

fn query_rows(conn: &Connection, sql: &str, params: Vec<SqlValue>) -> Result<Vec<DocRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(DocRow {
                id: row.get(0)?,
                body: row.get(1)?,
                version: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Stored precision is microseconds; truncate up front so a freshly created
/// `Doc` compares equal to the same document read back.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Corrupt timestamp '{}'", raw))?
        .with_timezone(&Utc))
}
