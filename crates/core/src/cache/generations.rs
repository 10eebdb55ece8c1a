//! Generation and entry operations.
//!
//! A generation is a named cache; entries are request/response pairs owned
//! by exactly one generation. Deleting a generation removes its entries via
//! the `ON DELETE CASCADE` foreign key.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::{Error, Request, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Identity of a stored entry, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedRequest {
    pub method: String,
    pub url: String,
}

/// Handle to one named generation.
///
/// Creating a handle does no I/O; the generation row is created by
/// [`CacheDb::open_generation`] or by the first write.
#[derive(Clone, Debug)]
pub struct Generation {
    db: CacheDb,
    name: String,
}

impl CacheDb {
    /// Lazy handle to a generation.
    pub fn generation(&self, name: &str) -> Generation {
        Generation { db: self.clone(), name: name.to_string() }
    }

    /// Create (or open) a generation and return its handle.
    pub async fn open_generation(&self, name: &str) -> Result<Generation, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(self.generation(name))
    }

    /// Enumerate generation names, oldest first.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at, rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation exists.
    pub async fn has_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no such generation existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

/// Row ready for insertion; built outside the connection thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(request: &Request, response: &Response) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::NotCacheable(format!("{} {}", request.method, request.url)));
        }
        if response.status == 206 {
            return Err(Error::NotCacheable(format!("partial response for {}", request.url)));
        }
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: compute_cache_key(&request.method, request.url.as_str()),
            method: request.method.clone(),
            url: request.url.to_string(),
            status: i64::from(response.status),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

const INSERT_GENERATION: &str = "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)";

const UPSERT_ENTRY: &str = "INSERT INTO entries (generation, key_hash, method, url, status, headers_json, body, stored_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(generation, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

impl Generation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request.
    ///
    /// Non-GET requests never match.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let name = self.name.clone();
        let key_hash = compute_cache_key(&request.method, request.url.as_str());
        self.db
            .conn
            .call(move |conn| -> Result<Option<(String, i64, String, Vec<u8>)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body FROM entries WHERE generation = ?1 AND key_hash = ?2",
                )?;
                let result = stmt.query_row(params![name, key_hash], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?
            .map(decode_response)
            .transpose()
    }

    /// Write or overwrite one entry.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::encode(request, response)?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(INSERT_GENERATION, params![name, now])?;
                tx.execute(
                    UPSERT_ENTRY,
                    params![name, row.key_hash, row.method, row.url, row.status, row.headers_json, row.body, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries in one transaction: either every entry is
    /// stored or none is.
    pub async fn put_all(&self, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::encode(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(INSERT_GENERATION, params![name, now])?;
                {
                    let mut stmt = tx.prepare(UPSERT_ENTRY)?;
                    for row in &rows {
                        stmt.execute(params![
                            name,
                            row.key_hash,
                            row.method,
                            row.url,
                            row.status,
                            row.headers_json,
                            row.body,
                            now
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Stored request identities, in insertion order.
    pub async fn requests(&self) -> Result<Vec<CachedRequest>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<CachedRequest>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY rowid")?;
                let requests = stmt
                    .query_map(params![name], |row| Ok(CachedRequest { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(requests)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> Result<usize, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}

fn decode_response((url, status, headers_json, body): (String, i64, String, Vec<u8>)) -> Result<Response, Error> {
    let url = Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("bad url {url}: {e}")))?;
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("bad status {status}")))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("bad headers: {e}")))?;
    Ok(Response { url, status, headers, body: Bytes::from(body) })
}
