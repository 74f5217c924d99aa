//! Search result types shared by both paper sources.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use appshelf_core::Error;

/// Which source(s) a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSource {
    #[serde(rename = "ss")]
    SemanticScholar,
    #[serde(rename = "oa")]
    OpenAlex,
    #[serde(rename = "both")]
    Both,
}

impl ResultSource {
    pub fn label(&self) -> &'static str {
        match self {
            ResultSource::SemanticScholar => "Semantic Scholar",
            ResultSource::OpenAlex => "OpenAlex",
            ResultSource::Both => "Semantic Scholar + OpenAlex",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

/// One paper, normalised from either source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Position in the source's relevance order; the second source is offset by 1000.
    pub rank: usize,
    pub id: String,
    /// Normalised DOI (no resolver prefix, lower-case).
    pub doi: Option<String>,
    pub title: String,
    pub authors: Vec<Author>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citation_count: Option<i64>,
    pub influential_citation_count: Option<i64>,
    pub open_access_url: Option<String>,
    pub doi_url: Option<String>,
    pub source: ResultSource,
}

/// Result ordering offered in the search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Relevance,
    Citations,
    Influential,
    Newest,
    Oldest,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Relevance,
        SortKey::Citations,
        SortKey::Influential,
        SortKey::Newest,
        SortKey::Oldest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Relevance => "Relevance",
            SortKey::Citations => "Most cited",
            SortKey::Influential => "Most influential",
            SortKey::Newest => "Newest",
            SortKey::Oldest => "Oldest",
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortKey::Relevance),
            "citations" => Ok(SortKey::Citations),
            "influential" => Ok(SortKey::Influential),
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            other => Err(Error::InvalidInput(format!("unknown sort key: {}", other))),
        }
    }
}

/// Merged results of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub query: String,
    pub papers: Vec<Paper>,
    /// Set when one source failed and only the other's results are shown.
    pub note: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

/// A result as shown in the search view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperView {
    #[serde(flatten)]
    pub paper: Paper,
    pub authors_label: String,
    pub in_library: bool,
    pub can_add: bool,
}
