//! SQLite-backed store for the document library, settings, and search cache.
//!
//! One connection behind a mutex; every call runs to completion before the
//! next starts, so writes to the same record are serialized.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info, warn};

use crate::schema::{KV_SCHEMA_SQL, SCHEMA_SQL};
use crate::types::*;
use appshelf_core::settings::KeyValueStore;
use appshelf_core::{now_millis, Error, Result};

pub const DB_FILE_NAME: &str = "appshelf.db";
pub const NOTE_PAD_KEY: &str = "notes-pad";

/// SQLite store for documents, payloads, annotations and key-value entries.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    quota_bytes: u64,
}

/// Map a rusqlite error onto the storage taxonomy.
fn db_err(e: rusqlite::Error) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            ErrorCode::DiskFull => Error::QuotaExceeded(e.to_string()),
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::ReadOnly
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase => Error::StorageUnavailable(e.to_string()),
            _ => Error::Database(e.to_string()),
        },
        _ => Error::Database(e.to_string()),
    }
}

/// Normalized cache key for a free-text query.
pub fn search_cache_key(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/appshelf.db`.
    pub fn open(db_dir: impl AsRef<Path>, quota_bytes: u64) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        let db_path = db_dir.join(DB_FILE_NAME);

        let conn = Connection::open(&db_path).map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Self::configure(&conn)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            quota_bytes,
        };

        let doc_count = store.count_documents()?;
        info!(
            "SqliteStore initialized: {} documents, quota={}MB, path={}",
            doc_count,
            quota_bytes / (1024 * 1024),
            store.db_path.display()
        );

        Ok(store)
    }

    /// In-memory store, used by tests and throwaway sessions.
    pub fn open_in_memory(quota_bytes: u64) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: PathBuf::from(":memory:"),
            quota_bytes,
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 2000;",
        )
        .map_err(db_err)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}", SCHEMA_SQL, KV_SCHEMA_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    // ---------------------------------------------------------------
    // Documents
    // ---------------------------------------------------------------

    /// All documents in insertion order.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id, name, size_bytes, page_count, added_at FROM documents ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt.query_map([], Self::row_to_document).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// All documents, most recently added first.
    pub fn list_documents_newest_first(&self) -> Result<Vec<Document>> {
        let mut docs = self.list_documents()?;
        docs.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
        Ok(docs)
    }

    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let doc = conn
            .prepare_cached("SELECT id, name, size_bytes, page_count, added_at FROM documents WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_document)
            .optional()
            .map_err(db_err)?;
        Ok(doc)
    }

    /// Names of every stored document.
    pub fn document_names(&self) -> Result<HashSet<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT name FROM documents").map_err(db_err)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(db_err)?;
        rows.collect::<rusqlite::Result<HashSet<_>>>().map_err(db_err)
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(db_err)
    }

    /// Total payload bytes currently stored.
    pub fn payload_bytes(&self) -> Result<i64> {
        let conn = self.conn.lock();
        Self::payload_bytes_in(&conn)
    }

    fn payload_bytes_in(conn: &Connection) -> Result<i64> {
        conn.query_row("SELECT COALESCE(SUM(LENGTH(payload)), 0) FROM document_bytes", [], |row| row.get(0))
            .map_err(db_err)
    }

    /// Store a document: metadata first, then the payload under the generated id.
    pub fn save_document(&self, name: &str, size_bytes: i64, payload: &[u8]) -> Result<i64> {
        self.save_document_at(name, size_bytes, payload, now_millis())
    }

    /// [`save_document`](Self::save_document) with an explicit `added_at`.
    ///
    /// The quota check and both inserts run under one lock, so concurrent
    /// saves cannot jointly exceed the quota.
    pub fn save_document_at(&self, name: &str, size_bytes: i64, payload: &[u8], added_at: i64) -> Result<i64> {
        let conn = self.conn.lock();
        let used = Self::payload_bytes_in(&conn)?;
        let needed = (used.max(0) as u64).saturating_add(payload.len() as u64);
        if needed > self.quota_bytes {
            return Err(Error::QuotaExceeded(format!(
                "{} bytes needed, quota is {} bytes",
                needed, self.quota_bytes
            )));
        }

        let id = conn
            .prepare_cached("INSERT INTO documents (name, size_bytes, page_count, added_at) VALUES (?1, ?2, 0, ?3)")
            .map_err(db_err)?
            .insert(params![name, size_bytes, added_at])
            .map_err(db_err)?;

        let stored = conn
            .prepare_cached("INSERT INTO document_bytes (id, payload) VALUES (?1, ?2)")
            .and_then(|mut stmt| stmt.execute(params![id, payload]));

        if let Err(e) = stored {
            warn!("Payload write for document {} failed, removing metadata: {}", id, e);
            if let Err(cleanup) = conn.execute("DELETE FROM documents WHERE id = ?1", params![id]) {
                warn!("Could not remove metadata for document {}: {}", id, cleanup);
            }
            return Err(db_err(e));
        }

        debug!("Saved document {} ({}, {} bytes)", id, name, payload.len());
        Ok(id)
    }

    /// Load a document's payload.
    pub fn load_document_bytes(&self, id: i64) -> Result<Vec<u8>> {
        let conn = self.conn.lock();
        let payload = conn
            .prepare_cached("SELECT payload FROM document_bytes WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], |row| row.get::<_, Vec<u8>>(0))
            .optional()
            .map_err(db_err)?;
        payload.ok_or_else(|| Error::RecordNotFound(format!("document bytes {}", id)))
    }

    /// Set the page count after the first successful render.
    pub fn update_page_count(&self, id: i64, page_count: i64) -> Result<Document> {
        if page_count < 0 {
            return Err(Error::InvalidInput(format!("page count {} is negative", page_count)));
        }
        let conn = self.conn.lock();
        let mut doc = conn
            .prepare_cached("SELECT id, name, size_bytes, page_count, added_at FROM documents WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![id], Self::row_to_document)
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| Error::RecordNotFound(format!("document {}", id)))?;

        doc.page_count = page_count;
        conn.execute(
            "UPDATE documents SET page_count = ?1 WHERE id = ?2",
            params![doc.page_count, doc.id],
        )
        .map_err(db_err)?;
        Ok(doc)
    }

    /// Delete a document's metadata and payload. Returns whether anything was removed.
    pub fn delete_document(&self, id: i64, mode: DeleteMode) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let meta = tx
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .map_err(db_err)?;
        let bytes = tx
            .execute("DELETE FROM document_bytes WHERE id = ?1", params![id])
            .map_err(db_err)?;
        let notes = match mode {
            DeleteMode::Cascade => tx
                .execute("DELETE FROM annotations WHERE document_id = ?1", params![id])
                .map_err(db_err)?,
            DeleteMode::KeepAnnotations => 0,
        };
        tx.commit().map_err(db_err)?;

        debug!(
            "Deleted document {}: meta={}, bytes={}, annotations={}",
            id, meta, bytes, notes
        );
        Ok(meta + bytes > 0)
    }

    // ---------------------------------------------------------------
    // Annotations
    // ---------------------------------------------------------------

    pub fn list_annotations(&self, document_id: i64) -> Result<Vec<Annotation>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, document_id, vertical_offset, question, answer, created_at \
                 FROM annotations WHERE document_id = ?1 ORDER BY id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![document_id], Self::row_to_annotation)
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Pin a question/answer note to a document.
    pub fn save_annotation(
        &self,
        document_id: i64,
        vertical_offset: f64,
        question: &str,
        answer: &str,
    ) -> Result<Annotation> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(Error::InvalidInput("question and answer are required".into()));
        }
        if !vertical_offset.is_finite() || vertical_offset < 0.0 {
            return Err(Error::InvalidInput(format!("invalid offset {}", vertical_offset)));
        }

        let created_at = now_millis();
        let conn = self.conn.lock();
        let exists: bool = conn
            .query_row("SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?1)", params![document_id], |row| row.get(0))
            .map_err(db_err)?;
        if !exists {
            return Err(Error::RecordNotFound(format!("document {}", document_id)));
        }

        let id = conn
            .prepare_cached(
                "INSERT INTO annotations (document_id, vertical_offset, question, answer, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(db_err)?
            .insert(params![document_id, vertical_offset, question, answer, created_at])
            .map_err(db_err)?;

        Ok(Annotation {
            id,
            document_id,
            vertical_offset,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at,
        })
    }

    pub fn delete_annotation(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM annotations WHERE id = ?1", params![id])
            .map_err(db_err)?;
        Ok(count > 0)
    }

    pub fn count_annotations(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))
            .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Search cache
    // ---------------------------------------------------------------

    /// Cached payload for `query` if it was stored less than `ttl` before `now`.
    pub fn get_cached_search(&self, query: &str, ttl: Duration, now: i64) -> Result<Option<String>> {
        let key = search_cache_key(query);
        let conn = self.conn.lock();
        let row: Option<(String, i64)> = conn
            .prepare_cached("SELECT payload, stored_at FROM search_cache WHERE query_key = ?1")
            .map_err(db_err)?
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()
            .map_err(db_err)?;

        match row {
            Some((payload, stored_at)) if now - stored_at < ttl.as_millis() as i64 => Ok(Some(payload)),
            Some(_) => {
                conn.execute("DELETE FROM search_cache WHERE query_key = ?1", params![key])
                    .map_err(db_err)?;
                debug!("Search cache entry for {:?} expired", key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn put_cached_search(&self, query: &str, payload: &str, now: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO search_cache (query_key, payload, stored_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(query_key) DO UPDATE SET payload = excluded.payload, stored_at = excluded.stored_at",
            params![search_cache_key(query), payload, now],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Drop every entry older than `ttl`. Returns the number removed.
    pub fn purge_search_cache(&self, ttl: Duration, now: i64) -> Result<usize> {
        let cutoff = now - ttl.as_millis() as i64;
        let conn = self.conn.lock();
        conn.execute("DELETE FROM search_cache WHERE stored_at <= ?1", params![cutoff])
            .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Notes pad
    // ---------------------------------------------------------------

    pub fn load_note_pad(&self) -> Result<NotePad> {
        match self.get_value(NOTE_PAD_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(NotePad::default()),
        }
    }

    pub fn save_note_pad(&self, body: &str) -> Result<NotePad> {
        let pad = NotePad {
            body: body.to_string(),
            updated_at: Some(now_millis()),
        };
        self.put_value(NOTE_PAD_KEY, &serde_json::to_string(&pad)?)?;
        Ok(pad)
    }

    // ---------------------------------------------------------------
    // Reports
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let total_documents = self.count_documents()?;
        let total_annotations = self.count_annotations()?;
        let payload_bytes = self.payload_bytes()?;

        let conn = self.conn.lock();
        let cached_searches: i64 = conn
            .query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0))
            .map_err(db_err)?;
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            total_documents,
            total_annotations,
            payload_bytes,
            quota_bytes: self.quota_bytes,
            cached_searches,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    /// Find half-written documents, stray payloads, and orphaned annotations.
    pub fn integrity_report(&self) -> Result<IntegrityReport> {
        let documents = self.count_documents()?;
        let annotations = self.count_annotations()?;

        let conn = self.conn.lock();
        let ids = |sql: &str| -> Result<Vec<i64>> {
            let mut stmt = conn.prepare(sql).map_err(db_err)?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0)).map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
        };

        Ok(IntegrityReport {
            documents,
            annotations,
            documents_missing_bytes: ids(
                "SELECT d.id FROM documents d LEFT JOIN document_bytes b ON b.id = d.id \
                 WHERE b.id IS NULL ORDER BY d.id",
            )?,
            orphaned_payloads: ids(
                "SELECT b.id FROM document_bytes b LEFT JOIN documents d ON d.id = b.id \
                 WHERE d.id IS NULL ORDER BY b.id",
            )?,
            orphaned_annotations: ids(
                "SELECT a.id FROM annotations a LEFT JOIN documents d ON d.id = a.document_id \
                 WHERE d.id IS NULL ORDER BY a.id",
            )?,
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: row.get("id")?,
            name: row.get("name")?,
            size_bytes: row.get("size_bytes")?,
            page_count: row.get("page_count")?,
            added_at: row.get("added_at")?,
        })
    }

    fn row_to_annotation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Annotation> {
        Ok(Annotation {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            vertical_offset: row.get("vertical_offset")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .prepare_cached("SELECT value FROM kv WHERE key = ?1")
            .map_err(db_err)?
            .query_row(params![key], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(value)
    }

    fn put_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now_millis()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
