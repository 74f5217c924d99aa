//! Offline database check — `appshelf validate [data-dir]`.
//!
//! Verifies the schema read-only, then reports the consistency findings
//! left behind by interrupted saves and non-cascading deletes.

use std::path::Path;

use rusqlite::Connection;
use tracing::warn;

use appshelf_store::sqlite::DB_FILE_NAME;
use appshelf_store::{IntegrityReport, SqliteStore};

/// Result of a validation run.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub db_valid: bool,
    pub documents: i64,
    pub annotations: i64,
    pub cached_searches: i64,
    pub integrity: Option<IntegrityReport>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.db_valid && self.errors.is_empty()
    }
}

const REQUIRED: &[(&str, &[&str])] = &[
    ("documents", &["id", "name", "size_bytes", "page_count", "added_at"]),
    ("document_bytes", &["id", "payload"]),
    (
        "annotations",
        &["id", "document_id", "vertical_offset", "question", "answer", "created_at"],
    ),
    ("kv", &["key", "value", "updated_at"]),
    ("search_cache", &["query_key", "payload", "stored_at"]),
];

/// Validate the AppShelf database under `data_dir/db/`.
pub fn validate(data_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let db_dir = data_dir.join("db");
    let db_path = db_dir.join(DB_FILE_NAME);
    if !db_path.exists() {
        report
            .errors
            .push(format!("Database not found: {}", db_path.display()));
        return report;
    }

    let conn = match Connection::open_with_flags(&db_path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open database: {}", e));
            return report;
        }
    };

    for (table, columns) in REQUIRED {
        match table_exists(&conn, table) {
            Ok(true) => {
                let present = get_column_names(&conn, table);
                for col in columns.iter() {
                    if !present.iter().any(|p| p == col) {
                        report
                            .errors
                            .push(format!("{} table missing column: {}", table, col));
                    }
                }
            }
            Ok(false) => report.errors.push(format!("Missing required table: {}", table)),
            Err(e) => report
                .errors
                .push(format!("Error checking table {}: {}", table, e)),
        }
    }
    drop(conn);

    if !report.errors.is_empty() {
        return report;
    }
    report.db_valid = true;

    let store = match SqliteStore::open(&db_dir, 0) {
        Ok(store) => store,
        Err(e) => {
            report.errors.push(format!("Failed to open store: {}", e));
            return report;
        }
    };

    match store.get_stats() {
        Ok(stats) => {
            report.documents = stats.total_documents;
            report.annotations = stats.total_annotations;
            report.cached_searches = stats.cached_searches;
        }
        Err(e) => report.warnings.push(format!("Cannot read statistics: {}", e)),
    }

    match store.integrity_report() {
        Ok(integrity) => {
            if !integrity.documents_missing_bytes.is_empty() {
                report.warnings.push(format!(
                    "{} documents have no stored bytes: {:?}",
                    integrity.documents_missing_bytes.len(),
                    integrity.documents_missing_bytes
                ));
            }
            if !integrity.orphaned_payloads.is_empty() {
                report.warnings.push(format!(
                    "{} payloads have no document",
                    integrity.orphaned_payloads.len()
                ));
            }
            if !integrity.orphaned_annotations.is_empty() {
                report.warnings.push(format!(
                    "{} annotations reference deleted documents",
                    integrity.orphaned_annotations.len()
                ));
            }
            report.integrity = Some(integrity);
        }
        Err(e) => {
            warn!("Integrity check failed: {}", e);
            report.errors.push(format!("Integrity check failed: {}", e));
        }
    }

    report
}

pub fn print_report(report: &ValidationReport) {
    println!("=== AppShelf Validation Report ===");
    println!();
    println!("Database valid:     {}", if report.db_valid { "YES" } else { "NO" });
    println!("Documents:          {}", report.documents);
    println!("Annotations:        {}", report.annotations);
    println!("Cached searches:    {}", report.cached_searches);

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.is_ok() {
        println!("Status: OK");
    } else {
        println!("Status: FAILED");
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn get_column_names(conn: &Connection, table: &str) -> Vec<String> {
    // table names come from REQUIRED only
    let query = format!("PRAGMA table_info({})", table);
    let mut names = Vec::new();
    if let Ok(mut stmt) = conn.prepare(&query) {
        if let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) {
            names.extend(rows.flatten());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use appshelf_store::DeleteMode;

    #[test]
    fn test_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate(dir.path());
        assert!(!report.is_ok());
        assert!(report.errors[0].contains("Database not found"));
    }

    #[test]
    fn test_clean_database() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(dir.path().join("db"), 1024 * 1024).unwrap();
            store.save_document("a.pdf", 3, b"abc").unwrap();
        }
        let report = validate(dir.path());
        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(report.documents, 1);
        assert!(report.warnings.is_empty());
        assert!(report.integrity.unwrap().is_clean());
    }

    #[test]
    fn test_orphaned_annotations_warn() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(dir.path().join("db"), 1024 * 1024).unwrap();
            let id = store.save_document("a.pdf", 3, b"abc").unwrap();
            store.save_annotation(id, 10.0, "Why?", "Because.").unwrap();
            store.delete_document(id, DeleteMode::KeepAnnotations).unwrap();
        }
        let report = validate(dir.path());
        assert!(report.is_ok());
        assert_eq!(report.annotations, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("annotations reference deleted documents"));
    }
}
