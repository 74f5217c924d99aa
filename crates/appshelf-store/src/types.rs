//! Data types for documents, annotations, and store reports.

use serde::{Deserialize, Serialize};

/// Document metadata row. The payload is stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub size_bytes: i64,
    /// 0 until the document has been rendered once.
    pub page_count: i64,
    pub added_at: i64,
}

/// A question/answer note pinned to a vertical offset in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: i64,
    pub document_id: i64,
    /// Pixels from the top of the scroll content.
    pub vertical_offset: f64,
    pub question: String,
    pub answer: String,
    pub created_at: i64,
}

/// What happens to a document's annotations when it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Leave annotations in place.
    #[default]
    KeepAnnotations,
    /// Delete annotations referencing the document as well.
    Cascade,
}

/// The single free-text notes pad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePad {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: i64,
    pub total_annotations: i64,
    pub payload_bytes: i64,
    pub quota_bytes: u64,
    pub cached_searches: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}

/// Consistency findings for the library tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub documents: i64,
    pub annotations: i64,
    /// Metadata rows whose payload write never completed.
    pub documents_missing_bytes: Vec<i64>,
    /// Payload rows with no metadata.
    pub orphaned_payloads: Vec<i64>,
    /// Annotations whose document has been deleted.
    pub orphaned_annotations: Vec<i64>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.documents_missing_bytes.is_empty()
            && self.orphaned_payloads.is_empty()
            && self.orphaned_annotations.is_empty()
    }
}
