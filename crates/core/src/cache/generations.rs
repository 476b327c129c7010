//! Cache generation CRUD on the SQLite store.
//!
//! Generations live in `caches`; their entries in `entries`, removed by
//! `ON DELETE CASCADE` when the generation is dropped.

use http::StatusCode;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use tokio_rusqlite::params;
use url::Url;

use super::connection::CacheDb;
use super::hash::{request_key, request_url};
use super::storage::CacheStorage;
use crate::Error;
use crate::request::{Request, Response};

/// An entry flattened into column values, ready to move onto the
/// connection thread.
#[derive(Debug, Clone)]
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
    response_url: Option<String>,
}

impl EntryRow {
    fn from_pair(request: &Request, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key_hash: request_key(request),
            method: request.method.as_str().to_string(),
            url: request_url(request),
            status: i64::from(response.status.as_u16()),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
            response_url: response.url.as_ref().map(|u| u.to_string()),
        })
    }
}

fn decode_response(
    status: i64, headers_json: &str, body: Vec<u8>, response_url: Option<String>,
) -> Result<Response, Error> {
    let status = u16::try_from(status)
        .ok()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .ok_or_else(|| Error::CorruptEntry(format!("invalid status {status}")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(headers_json)?;
    let url = response_url
        .map(|u| Url::parse(&u).map_err(|e| Error::CorruptEntry(e.to_string())))
        .transpose()?;

    Ok(Response { status, headers, body: body.into(), url })
}

/// Insert the generation if absent and return its id.
fn ensure_cache(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT INTO caches (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM caches WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

fn upsert_entry(conn: &rusqlite::Connection, cache_id: i64, row: &EntryRow, stored_at: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (
            cache_id, key_hash, method, url, status, headers_json, body, response_url, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(cache_id, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            response_url = excluded.response_url,
            stored_at = excluded.stored_at",
        params![
            cache_id,
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            &row.headers_json,
            &row.body,
            &row.response_url,
            stored_at,
        ],
    )?;
    Ok(())
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_cache(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_request(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let name = name.to_string();
        let key_hash = request_key(request);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body, e.response_url
                         FROM entries e JOIN caches c ON c.id = e.cache_id
                         WHERE c.name = ?1 AND e.key_hash = ?2",
                        params![name, key_hash],
                        |row| {
                            Ok((
                                row.get::<_, i64>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, Vec<u8>>(2)?,
                                row.get::<_, Option<String>>(3)?,
                            ))
                        },
                    )
                    .optional()?;

                match row {
                    Some((status, headers_json, body, response_url)) => {
                        decode_response(status, &headers_json, body, response_url).map(Some)
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let name = name.to_string();
        let row = EntryRow::from_pair(request, response)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let cache_id = ensure_cache(conn, &name)?;
                upsert_entry(conn, cache_id, &row, &chrono::Utc::now().to_rfc3339())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let name = name.to_string();
        let rows = entries
            .iter()
            .map(|(req, res)| EntryRow::from_pair(req, res))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let cache_id = ensure_cache(&tx, &name)?;
                let stored_at = chrono::Utc::now().to_rfc3339();
                for row in &rows {
                    upsert_entry(&tx, cache_id, row, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let cache_id: Option<i64> = conn
                    .query_row("SELECT id FROM caches WHERE name = ?1", params![&name], |row| row.get(0))
                    .optional()?;
                let Some(cache_id) = cache_id else {
                    return Err(Error::CacheMiss(name));
                };

                let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_id = ?1 ORDER BY rowid ASC")?;
                let urls = stmt
                    .query_map(params![cache_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(path: &str) -> Request {
        Request::get(Url::parse(&format!("https://hub.example{path}")).unwrap())
    }

    fn page(body: &'static str) -> Response {
        Response::new(StatusCode::OK, body)
            .with_header("content-type", "text/html")
            .with_url(Url::parse("https://hub.example/index.html").unwrap())
    }

    #[tokio::test]
    async fn test_put_and_match_roundtrip_fields() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = page("<h1>Hub</h1>");
        db.put("student-hub-v13", &req("/index.html"), &response).await.unwrap();

        let hit = db
            .match_request("student-hub-v13", &req("/index.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, response);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_request("v1", &req("/index.html")).await.unwrap().is_none());
        db.open("v1").await.unwrap();
        assert!(db.match_request("v1", &req("/index.html")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", &req("/style.css"), &page("a")).await.unwrap();
        db.put("v1", &req("/style.css"), &page("b")).await.unwrap();

        assert_eq!(db.entries("v1").await.unwrap(), vec!["https://hub.example/style.css"]);
        let hit = db.match_request("v1", &req("/style.css")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"b");
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", &req("/index.html"), &page("x")).await.unwrap();
        db.put("v2", &req("/index.html"), &page("y")).await.unwrap();

        assert!(db.delete("v1").await.unwrap());
        assert!(!db.delete("v1").await.unwrap());
        assert_eq!(db.keys().await.unwrap(), vec!["v2"]);

        let orphans: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(orphans, 1);
    }

    #[tokio::test]
    async fn test_put_all_preserves_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let batch = vec![(req("/b.js"), page("b")), (req("/a.js"), page("a")), (req("/c.js"), page("c"))];
        db.put_all("v1", &batch).await.unwrap();

        assert_eq!(
            db.entries("v1").await.unwrap(),
            vec!["https://hub.example/b.js", "https://hub.example/a.js", "https://hub.example/c.js"]
        );
    }

    #[tokio::test]
    async fn test_entries_missing_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.entries("nope").await, Err(Error::CacheMiss(name)) if name == "nope"));
    }

    #[test]
    fn test_corrupt_status_rejected() {
        let err = decode_response(42, "[]", Vec::new(), None).unwrap_err();
        assert!(matches!(err, Error::CorruptEntry(_)));
    }
}
