//! OpenAlex works API client.

use std::collections::{BTreeMap, HashMap};

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use appshelf_core::{Error, Result};

use crate::doi::{doi_url, normalize_doi};
use crate::source::{network_err, PaperIndex, RESULT_LIMIT};
use crate::types::{Author, Paper, ResultSource};

/// OpenAlex results rank after the first source.
pub const RANK_OFFSET: usize = 1000;

const SELECT: &str = "id,title,authorships,publication_year,abstract_inverted_index,cited_by_count,open_access,doi,primary_location";

#[derive(Debug, Deserialize)]
pub struct WorksResponse {
    #[serde(default)]
    pub results: Option<Vec<RawWork>>,
}

#[derive(Debug, Deserialize)]
pub struct RawWork {
    pub id: String,
    pub title: Option<String>,
    pub authorships: Option<Vec<RawAuthorship>>,
    pub publication_year: Option<i32>,
    pub abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    pub cited_by_count: Option<i64>,
    pub open_access: Option<RawOpenAccess>,
    pub doi: Option<String>,
    pub primary_location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
pub struct RawAuthorship {
    pub author: Option<RawAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct RawAuthor {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOpenAccess {
    pub oa_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    pub source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
pub struct RawSource {
    pub display_name: Option<String>,
}

/// Rebuild abstract text from OpenAlex's word -> positions index.
pub fn abstract_from_inverted_index(index: &HashMap<String, Vec<usize>>) -> String {
    let mut words: BTreeMap<usize, &str> = BTreeMap::new();
    for (word, positions) in index {
        for &pos in positions {
            words.insert(pos, word.as_str());
        }
    }
    words
        .into_values()
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_response(response: WorksResponse) -> Vec<Paper> {
    response
        .results
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let doi = normalize_doi(w.doi.as_deref());
            Paper {
                rank: RANK_OFFSET + i,
                id: w.id,
                doi_url: doi.as_deref().map(doi_url),
                doi,
                title: w.title.unwrap_or_else(|| "Untitled".to_string()),
                authors: w
                    .authorships
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|a| a.author.and_then(|a| a.display_name))
                    .filter(|n| !n.trim().is_empty())
                    .map(|name| Author { name, author_id: None })
                    .collect(),
                year: w.publication_year,
                journal: w
                    .primary_location
                    .and_then(|l| l.source)
                    .and_then(|s| s.display_name)
                    .filter(|n| !n.is_empty()),
                abstract_text: w
                    .abstract_inverted_index
                    .as_ref()
                    .map(abstract_from_inverted_index)
                    .filter(|a| !a.is_empty()),
                citation_count: w.cited_by_count,
                influential_citation_count: None,
                open_access_url: w.open_access.and_then(|o| o.oa_url).filter(|u| !u.is_empty()),
                source: ResultSource::OpenAlex,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct OpenAlexClient {
    client: Client,
    base_url: String,
}

impl OpenAlexClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl PaperIndex for OpenAlexClient {
    fn name(&self) -> &'static str {
        "OpenAlex"
    }

    async fn search(&self, query: &str) -> Result<Vec<Paper>> {
        let url = format!("{}/works", self.base_url);
        let per_page = RESULT_LIMIT.to_string();
        debug!("OpenAlex search: {:?}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("search", query), ("select", SELECT), ("per-page", per_page.as_str())])
            .send()
            .await
            .map_err(|e| network_err(self.name(), e))?;

        if !response.status().is_success() {
            return Err(Error::NetworkFailure(format!(
                "OpenAlex returned {}",
                response.status()
            )));
        }

        let body: WorksResponse = response.json().await.map_err(|e| network_err(self.name(), e))?;
        Ok(parse_response(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "meta": {"count": 1},
        "results": [
            {
                "id": "https://openalex.org/W1",
                "title": "Market Making in FX",
                "authorships": [
                    {"author": {"display_name": "Ada Lovelace"}},
                    {"author": null}
                ],
                "publication_year": 2020,
                "abstract_inverted_index": {"markets": [1], "FX": [0], "quote": [2, 4], "dealers": [3]},
                "cited_by_count": 12,
                "open_access": {"is_oa": true, "oa_url": "https://example.org/fx.pdf"},
                "doi": "https://doi.org/10.1/FX",
                "primary_location": {"source": {"display_name": "Journal of FX"}}
            }
        ]
    }"#;

    #[test]
    fn test_parse_response() {
        let response: WorksResponse = serde_json::from_str(FIXTURE).unwrap();
        let papers = parse_response(response);
        assert_eq!(papers.len(), 1);

        let p = &papers[0];
        assert_eq!(p.rank, 1000);
        assert_eq!(p.doi.as_deref(), Some("10.1/fx"));
        assert_eq!(p.authors.len(), 1);
        assert_eq!(p.journal.as_deref(), Some("Journal of FX"));
        assert_eq!(p.abstract_text.as_deref(), Some("FX markets quote dealers quote"));
        assert_eq!(p.influential_citation_count, None);
        assert_eq!(p.open_access_url.as_deref(), Some("https://example.org/fx.pdf"));
        assert_eq!(p.source, ResultSource::OpenAlex);
    }

    #[test]
    fn test_sparse_positions() {
        let mut index = HashMap::new();
        index.insert("end".to_string(), vec![10]);
        index.insert("start".to_string(), vec![0]);
        assert_eq!(abstract_from_inverted_index(&index), "start end");
    }
}
