//! Generation and entry operations.
//!
//! A generation is a named set of stored responses. Entries are whole-value
//! upserts keyed by request, so concurrent writers to one key simply leave the
//! last complete write in place.

use super::connection::CacheDb;
use super::hash::{compute_request_key, normalize_url};
use crate::Error;
use crate::request::{CacheRequest, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Metadata of a stored entry, without its body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub generation: String,
    pub request_key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_len: u64,
    pub stored_at: String,
}

/// Owned, thread-movable form of one entry row.
struct EntryRow {
    request_key: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(request: &CacheRequest, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        Ok(Self {
            request_key: compute_request_key(&request.method, &request.url),
            method: request.method.clone(),
            url: normalize_url(&request.url),
            status: i64::from(response.status),
            headers_json,
            body: response.body.to_vec(),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, generation: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            "INSERT INTO entries (generation, request_key, method, url, status, headers_json, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(generation, request_key) DO UPDATE SET
                method = excluded.method,
                url = excluded.url,
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                generation,
                &self.request_key,
                &self.method,
                &self.url,
                self.status,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn decode_status(status: i64) -> Result<u16, Error> {
    u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status out of range: {status}")))
}

fn decode_headers(headers_json: &str) -> Result<Vec<(String, String)>, Error> {
    serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
}

fn generation_exists(conn: &rusqlite::Connection, name: &str) -> Result<bool, Error> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl CacheDb {
    /// Create a generation if it does not exist.
    ///
    /// Returns true if a new generation was created.
    pub async fn create_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let created = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(created == 1)
            })
            .await
            .map_err(Error::from)
    }

    /// Store one entry in an existing generation.
    ///
    /// Fails with `CacheMiss` if the generation does not exist; a deleted
    /// generation is never brought back by a late write.
    pub async fn put_entry(&self, generation: &str, request: &CacheRequest, response: &Response) -> Result<(), Error> {
        let row = EntryRow::encode(request, response)?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                if !generation_exists(conn, &generation)? {
                    return Err(Error::CacheMiss(format!("generation {generation}")));
                }
                row.upsert(conn, &generation, &now)
            })
            .await
            .map_err(Error::from)
    }

    /// Create a generation (if needed) and replace its contents with
    /// `entries` in one transaction. Either all entries become visible or none
    /// do; entries left over from an earlier population are dropped.
    pub async fn put_entries(&self, generation: &str, entries: &[(CacheRequest, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::encode(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![&generation, &now],
                )?;
                tx.execute("DELETE FROM entries WHERE generation = ?1", params![&generation])?;
                for row in &rows {
                    row.upsert(&tx, &generation, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for a request in one generation.
    ///
    /// The returned response carries the normalized request URL.
    /// Returns None if the generation or the entry doesn't exist.
    pub async fn get_entry(&self, generation: &str, request: &CacheRequest) -> Result<Option<Response>, Error> {
        let generation = generation.to_string();
        let key = compute_request_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, i64, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT url, status, headers_json, body FROM entries
                     WHERE generation = ?1 AND request_key = ?2",
                    params![generation, key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(|(url, status, headers_json, body)| {
            Ok(Response {
                url,
                status: decode_status(status)?,
                headers: decode_headers(&headers_json)?,
                body: Bytes::from(body),
            })
        })
        .transpose()
    }

    /// Generation names in creation order.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and, by cascade, all of its entries.
    ///
    /// Returns false if no such generation existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in a generation.
    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for every entry in a generation, ordered by URL.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<EntryMeta>, Error> {
        self.query_meta(generation, None).await
    }

    /// Metadata for the entries stored under `url` in a generation.
    pub async fn find_entries_by_url(&self, generation: &str, url: &url::Url) -> Result<Vec<EntryMeta>, Error> {
        self.query_meta(generation, Some(normalize_url(url))).await
    }

    async fn query_meta(&self, generation: &str, url: Option<String>) -> Result<Vec<EntryMeta>, Error> {
        let label = generation.to_string();
        let generation = generation.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(String, String, String, i64, String, i64, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT request_key, method, url, status, headers_json, length(body), stored_at
                     FROM entries
                     WHERE generation = ?1 AND (?2 IS NULL OR url = ?2)
                     ORDER BY url ASC, method ASC",
                )?;
                let rows = stmt
                    .query_map(params![&generation, &url], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(request_key, method, url, status, headers_json, body_len, stored_at)| {
                Ok(EntryMeta {
                    generation: label.clone(),
                    request_key,
                    method,
                    url,
                    status: decode_status(status)?,
                    headers: decode_headers(&headers_json)?,
                    body_len: body_len as u64,
                    stored_at,
                })
            })
            .collect()
    }
}
