//! Per-store entry operations.
//!
//! A [`CacheStore`] is a handle on one named store. Writing to a store that
//! does not exist yet creates it, the way opening a browser cache does.

use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::http::{Request, Response};
use crate::Error;

/// Handle on a single named cache store.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

/// Response columns, shared by every lookup query.
pub(crate) const RESPONSE_COLUMNS: &str = "status, status_text, response_type, response_url, headers_json, body";

/// Row-level representation of a stored entry.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    response_type: String,
    response_url: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn from_parts(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: compute_cache_key(&request.method, request.url.as_str()),
            method: request.method.to_ascii_uppercase(),
            url: request.url.to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            response_type: response.response_type.as_str().to_string(),
            response_url: response.url.as_ref().map(Url::to_string),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

/// Decode a row selected with [`RESPONSE_COLUMNS`] starting at `offset`.
pub(crate) fn response_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<RawResponse> {
    Ok(RawResponse {
        status: row.get(offset)?,
        status_text: row.get(offset + 1)?,
        response_type: row.get(offset + 2)?,
        response_url: row.get(offset + 3)?,
        headers_json: row.get(offset + 4)?,
        body: row.get(offset + 5)?,
    })
}

/// Undecoded response columns.
pub(crate) struct RawResponse {
    status: u16,
    status_text: String,
    response_type: String,
    response_url: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl RawResponse {
    pub(crate) fn decode(self) -> Result<Response, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("invalid headers: {e}")))?;
        let url = self
            .response_url
            .map(|u| Url::parse(&u))
            .transpose()
            .map_err(|e| Error::CorruptEntry(format!("invalid response url: {e}")))?;

        Ok(Response {
            status: self.status,
            status_text: self.status_text,
            headers,
            body: Bytes::from(self.body),
            response_type: self.response_type.parse()?,
            url,
        })
    }
}

fn insert_entry(conn: &rusqlite::Connection, store: &str, row: &EntryRow, stored_at: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cache_entries (
            store, key_hash, method, url, status, status_text,
            response_type, response_url, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            status = excluded.status,
            status_text = excluded.status_text,
            response_type = excluded.response_type,
            response_url = excluded.response_url,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            &row.response_type,
            &row.response_url,
            &row.headers_json,
            &row.body,
            stored_at,
        ],
    )?;
    Ok(())
}

pub(crate) fn ensure_store(conn: &rusqlite::Connection, name: &str, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, now],
    )?;
    Ok(())
}

impl CacheDb {
    /// Handle on the store called `name`. Nothing is created until the
    /// first write.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore { db: self.clone(), name: name.to_string() }
    }
}

impl CacheStore {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `response` under the identity of `request`, replacing any
    /// previous entry. Concurrent writers to the same key: last write wins.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::from_parts(request, response)?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                insert_entry(&tx, &name, &row, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store every pair or none of them.
    pub async fn put_all(&self, entries: Vec<(Request, Response)>) -> Result<usize, Error> {
        let rows = entries
            .iter()
            .map(|(req, resp)| EntryRow::from_parts(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                for row in &rows {
                    insert_entry(&tx, &name, row, &now)?;
                }
                tx.commit()?;
                Ok(rows.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry stored for `request` in this store only.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        let name = self.name.clone();
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Option<RawResponse>, Error> {
                let sql = format!("SELECT {RESPONSE_COLUMNS} FROM cache_entries WHERE store = ?1 AND key_hash = ?2");
                let result = conn.query_row(&sql, params![name, key_hash], |row| response_from_row(row, 0));
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

    /// Remove the entry for `request`. Returns whether one existed.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![name, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of the stored requests, in insertion order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store = ?1 ORDER BY rowid")?;
                let urls = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
