//! Store-level operations: enumerate, delete, purge, and match across all
//! live stores.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::entries::{RESPONSE_COLUMNS, RawResponse, response_from_row};
use super::hash::compute_cache_key;
use crate::http::{Request, Response};
use crate::Error;

/// Name and size of one cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Names of every existing store, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it. Returns whether it existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every store except `keep`, all in one transaction. Returns
    /// the deleted names, oldest first.
    pub async fn retain_only(&self, keep: &str) -> Result<Vec<String>, Error> {
        self.purge_stores(Some(keep.to_string())).await
    }

    /// Delete every store. Returns the deleted names, oldest first.
    pub async fn clear(&self) -> Result<Vec<String>, Error> {
        self.purge_stores(None).await
    }

    async fn purge_stores(&self, keep: Option<String>) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
                let mut doomed = Vec::new();
                {
                    let mut stmt = tx.prepare("SELECT name FROM cache_stores ORDER BY rowid")?;
                    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
                    for name in names {
                        let name = name?;
                        if keep.as_deref() != Some(name.as_str()) {
                            doomed.push(name);
                        }
                    }
                }
                for name in &doomed {
                    tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                }
                tx.commit()?;
                Ok(doomed)
            })
            .await
            .map_err(Error::from)
    }

    /// Look `request` up in every store, oldest store first, and return the
    /// first hit.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawResponse>, Error> {
                let sql = format!(
                    "SELECT {RESPONSE_COLUMNS} FROM cache_entries e
                     JOIN cache_stores s ON s.name = e.store
                     WHERE e.key_hash = ?1
                     ORDER BY s.rowid
                     LIMIT 1"
                );
                let result = conn.query_row(&sql, params![key_hash], |row| response_from_row(row, 0));
                match result {
                    Ok(raw) => Ok(Some(raw)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        raw.map(RawResponse::decode).transpose()
    }

    /// Every store with its entry count, oldest first.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                     FROM cache_stores s
                     LEFT JOIN cache_entries e ON e.store = s.name
                     GROUP BY s.name
                     ORDER BY s.rowid",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(StoreSummary { name: row.get(0)?, created_at: row.get(1)?, entries: row.get::<_, i64>(2)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}
