//! Semantic Scholar Graph API client.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use appshelf_core::{Error, Result};

use crate::doi::{doi_url, normalize_doi};
use crate::source::{network_err, PaperIndex, RESULT_LIMIT};
use crate::types::{Author, Paper, ResultSource};

const FIELDS: &str =
    "title,authors,year,abstract,citationCount,influentialCitationCount,openAccessPdf,externalIds,journal";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<RawPaper>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPaper {
    pub paper_id: String,
    pub title: Option<String>,
    pub authors: Option<Vec<RawAuthor>>,
    pub year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citation_count: Option<i64>,
    pub influential_citation_count: Option<i64>,
    pub open_access_pdf: Option<RawOpenAccess>,
    pub external_ids: Option<RawExternalIds>,
    pub journal: Option<RawJournal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthor {
    pub name: Option<String>,
    pub author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOpenAccess {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawExternalIds {
    #[serde(rename = "DOI")]
    pub doi: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawJournal {
    pub name: Option<String>,
}

/// Convert a search response, ranking results by position.
pub fn parse_response(response: SearchResponse) -> Vec<Paper> {
    response
        .data
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let doi = normalize_doi(p.external_ids.and_then(|ids| ids.doi).as_deref());
            Paper {
                rank: i,
                id: p.paper_id,
                doi_url: doi.as_deref().map(doi_url),
                doi,
                title: p.title.unwrap_or_else(|| "Untitled".to_string()),
                authors: p
                    .authors
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|a| {
                        a.name.filter(|n| !n.trim().is_empty()).map(|name| Author {
                            name,
                            author_id: a.author_id,
                        })
                    })
                    .collect(),
                year: p.year,
                journal: p.journal.and_then(|j| j.name).filter(|n| !n.is_empty()),
                abstract_text: p.abstract_text,
                citation_count: p.citation_count,
                influential_citation_count: p.influential_citation_count,
                open_access_url: p.open_access_pdf.and_then(|o| o.url).filter(|u| !u.is_empty()),
                source: ResultSource::SemanticScholar,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct SemanticScholarClient {
    client: Client,
    base_url: String,
}

impl SemanticScholarClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl PaperIndex for SemanticScholarClient {
    fn name(&self) -> &'static str {
        "Semantic Scholar"
    }

    async fn search(&self, query: &str) -> Result<Vec<Paper>> {
        let url = format!("{}/graph/v1/paper/search", self.base_url);
        let limit = RESULT_LIMIT.to_string();
        debug!("Semantic Scholar search: {:?}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("fields", FIELDS), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| network_err(self.name(), e))?;

        if !response.status().is_success() {
            return Err(Error::NetworkFailure(format!(
                "Semantic Scholar returned {}",
                response.status()
            )));
        }

        let body: SearchResponse = response.json().await.map_err(|e| network_err(self.name(), e))?;
        Ok(parse_response(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "total": 2,
        "data": [
            {
                "paperId": "abc123",
                "title": "Option Pricing Under Stochastic Volatility",
                "authors": [{"authorId": "1", "name": "Steven L. Heston"}],
                "year": 1993,
                "abstract": null,
                "citationCount": 9000,
                "influentialCitationCount": 1200,
                "openAccessPdf": {"url": "https://example.org/heston.pdf"},
                "externalIds": {"DOI": "10.1093/RFS/6.2.327"},
                "journal": {"name": "Review of Financial Studies"}
            },
            {
                "paperId": "def456",
                "title": null,
                "authors": null,
                "year": null,
                "citationCount": null,
                "influentialCitationCount": null,
                "openAccessPdf": null,
                "externalIds": null,
                "journal": null
            }
        ]
    }"#;

    #[test]
    fn test_parse_response() {
        let response: SearchResponse = serde_json::from_str(FIXTURE).unwrap();
        let papers = parse_response(response);
        assert_eq!(papers.len(), 2);

        let heston = &papers[0];
        assert_eq!(heston.rank, 0);
        assert_eq!(heston.doi.as_deref(), Some("10.1093/rfs/6.2.327"));
        assert_eq!(heston.doi_url.as_deref(), Some("https://doi.org/10.1093/rfs/6.2.327"));
        assert_eq!(heston.authors[0].name, "Steven L. Heston");
        assert_eq!(heston.authors[0].author_id.as_deref(), Some("1"));
        assert_eq!(heston.journal.as_deref(), Some("Review of Financial Studies"));
        assert_eq!(heston.source, ResultSource::SemanticScholar);

        let bare = &papers[1];
        assert_eq!(bare.rank, 1);
        assert_eq!(bare.title, "Untitled");
        assert!(bare.authors.is_empty());
        assert!(bare.doi.is_none());
        assert!(bare.open_access_url.is_none());
    }

    #[test]
    fn test_missing_data_is_empty() {
        let response: SearchResponse = serde_json::from_str(r#"{"total": 0}"#).unwrap();
        assert!(parse_response(response).is_empty());
    }
}
