//! Cached dual-source search and add-to-library.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use appshelf_core::{now_millis, AppShelfConfig, Error, Result};
use appshelf_store::{Document, SqliteStore};

use crate::merge::{merge_results, visible_results};
use crate::naming::{make_pdf_name, make_unique_name};
use crate::openalex::OpenAlexClient;
use crate::semantic_scholar::SemanticScholarClient;
use crate::source::{build_client, HttpFetcher, PaperIndex, PdfFetcher};
use crate::types::{Paper, PaperView, SearchOutcome, SortKey};

pub const SEARCH_FAILED: &str = "Search failed. Check your connection and try again.";
pub const FETCH_FAILED: &str = "Could not fetch PDF. Try the DOI link instead.";

/// Note shown when one source failed and the other's results are shown alone.
pub fn degraded_note(failed: &str, shown: &str) -> String {
    format!("{} unavailable; showing {} results only.", failed, shown)
}

/// Literature search over two indexes, with a store-backed result cache.
pub struct ResearchService<P = SemanticScholarClient, S = OpenAlexClient, F = HttpFetcher> {
    primary: P,
    secondary: S,
    fetcher: F,
    store: Arc<SqliteStore>,
    cache_ttl: Duration,
}

impl ResearchService {
    /// Service over the public Semantic Scholar and OpenAlex APIs.
    pub fn from_config(config: &AppShelfConfig, store: Arc<SqliteStore>) -> Result<Self> {
        let client = build_client(config.http_timeout)?;
        info!(
            "Research sources: {} and {}",
            config.semantic_scholar_url, config.openalex_url
        );
        Ok(Self::new(
            SemanticScholarClient::new(client.clone(), config.semantic_scholar_url.clone()),
            OpenAlexClient::new(client.clone(), config.openalex_url.clone()),
            HttpFetcher::new(client),
            store,
            config.search_cache_ttl,
        ))
    }
}

impl<P: PaperIndex, S: PaperIndex, F: PdfFetcher> ResearchService<P, S, F> {
    pub fn new(primary: P, secondary: S, fetcher: F, store: Arc<SqliteStore>, cache_ttl: Duration) -> Self {
        Self {
            primary,
            secondary,
            fetcher,
            store,
            cache_ttl,
        }
    }

    /// Query both indexes concurrently and merge. Fresh cached results are
    /// returned without touching the network. Results are only cached when
    /// both sources answered.
    pub async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("empty search query".into()));
        }

        if let Some(papers) = self.cached(query) {
            debug!("Search cache hit for {:?}", query);
            return Ok(SearchOutcome {
                query: query.to_string(),
                papers,
                note: None,
                cached: true,
            });
        }

        let (first, second) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("search".into())),
            pair = async { tokio::join!(self.primary.search(query), self.secondary.search(query)) } => pair,
        };

        let (first, second, note) = match (first, second) {
            (Err(a), Err(b)) => {
                warn!("Both searches failed: {}; {}", a, b);
                return Err(Error::NetworkFailure(SEARCH_FAILED.into()));
            }
            (Err(e), Ok(second)) => {
                warn!("{} search failed: {}", self.primary.name(), e);
                let note = degraded_note(self.primary.name(), self.secondary.name());
                (Vec::new(), second, Some(note))
            }
            (Ok(first), Err(e)) => {
                warn!("{} search failed: {}", self.secondary.name(), e);
                let note = degraded_note(self.secondary.name(), self.primary.name());
                (first, Vec::new(), Some(note))
            }
            (Ok(first), Ok(second)) => (first, second, None),
        };

        let papers = merge_results(first, second);
        info!("Search {:?}: {} results", query, papers.len());

        if note.is_none() {
            self.remember(query, &papers);
        }

        Ok(SearchOutcome {
            query: query.to_string(),
            papers,
            note,
            cached: false,
        })
    }

    fn cached(&self, query: &str) -> Option<Vec<Paper>> {
        let payload = match self.store.get_cached_search(query, self.cache_ttl, now_millis()) {
            Ok(payload) => payload?,
            Err(e) => {
                warn!("Search cache read failed: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(papers) => Some(papers),
            Err(e) => {
                warn!("Discarding unreadable cached search: {}", e);
                None
            }
        }
    }

    fn remember(&self, query: &str, papers: &[Paper]) {
        let stored = serde_json::to_string(papers)
            .map_err(Error::from)
            .and_then(|payload| self.store.put_cached_search(query, &payload, now_millis()));
        if let Err(e) = stored {
            warn!("Search cache write failed: {}", e);
        }
    }

    pub fn library_names(&self) -> Result<HashSet<String>> {
        self.store.document_names()
    }

    /// Visible results of `outcome` in `sort` order, flagged against the library.
    pub fn view(&self, outcome: &SearchOutcome, sort: SortKey) -> Result<Vec<PaperView>> {
        Ok(visible_results(&outcome.papers, sort, &self.library_names()?))
    }

    /// Download the paper's open-access PDF and store it under a unique name.
    pub async fn add_to_library(&self, paper: &Paper, cancel: &CancellationToken) -> Result<Document> {
        let url = paper
            .open_access_url
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("No open-access PDF".into()))?;

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled("download".into())),
            fetched = self.fetcher.fetch(url) => fetched,
        };
        let bytes = fetched.map_err(|e| {
            warn!("PDF download from {} failed: {}", url, e);
            Error::NetworkFailure(FETCH_FAILED.into())
        })?;

        let name = make_unique_name(&make_pdf_name(paper), &self.library_names()?);
        let id = self.store.save_document(&name, bytes.len() as i64, &bytes)?;
        info!("Added {:?} to library as document {}", name, id);

        self.store
            .get_document(id)?
            .ok_or_else(|| Error::RecordNotFound(format!("document {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::paper;
    use crate::types::ResultSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeIndex {
        name: &'static str,
        result: std::result::Result<Vec<Paper>, String>,
        calls: AtomicUsize,
    }

    impl FakeIndex {
        fn ok(name: &'static str, papers: Vec<Paper>) -> Self {
            Self { name, result: Ok(papers), calls: AtomicUsize::new(0) }
        }

        fn failing(name: &'static str) -> Self {
            Self { name, result: Err("connection refused".into()), calls: AtomicUsize::new(0) }
        }
    }

    impl PaperIndex for FakeIndex {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str) -> Result<Vec<Paper>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(Error::NetworkFailure)
        }
    }

    struct FakeFetcher(Option<Vec<u8>>);

    impl PdfFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            self.0.clone().ok_or_else(|| Error::NetworkFailure("404".into()))
        }
    }

    fn service(
        primary: FakeIndex,
        secondary: FakeIndex,
        fetcher: FakeFetcher,
    ) -> (ResearchService<FakeIndex, FakeIndex, FakeFetcher>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path(), 1024 * 1024).unwrap());
        let svc = ResearchService::new(primary, secondary, fetcher, store, Duration::from_secs(24 * 3600));
        (svc, dir)
    }

    fn ss_papers() -> Vec<Paper> {
        vec![
            paper("s1", 0, Some("10.1/a"), ResultSource::SemanticScholar),
            paper("s2", 1, None, ResultSource::SemanticScholar),
        ]
    }

    fn oa_papers() -> Vec<Paper> {
        vec![paper("o1", 1000, Some("10.1/a"), ResultSource::OpenAlex)]
    }

    #[tokio::test]
    async fn test_search_merges_and_caches() {
        let (svc, _dir) = service(
            FakeIndex::ok("Semantic Scholar", ss_papers()),
            FakeIndex::ok("OpenAlex", oa_papers()),
            FakeFetcher(None),
        );
        let cancel = CancellationToken::new();

        let outcome = svc.search("  Heston model ", &cancel).await.unwrap();
        assert_eq!(outcome.query, "Heston model");
        assert_eq!(outcome.papers.len(), 2);
        assert_eq!(outcome.papers[0].source, ResultSource::Both);
        assert!(outcome.note.is_none());
        assert!(!outcome.cached);

        let again = svc.search("heston MODEL", &cancel).await.unwrap();
        assert!(again.cached);
        assert_eq!(again.papers, outcome.papers);
        assert_eq!(svc.primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_degraded_search_is_not_cached() {
        let (svc, _dir) = service(
            FakeIndex::failing("Semantic Scholar"),
            FakeIndex::ok("OpenAlex", oa_papers()),
            FakeFetcher(None),
        );
        let cancel = CancellationToken::new();

        let outcome = svc.search("fx", &cancel).await.unwrap();
        assert_eq!(outcome.papers.len(), 1);
        assert_eq!(
            outcome.note.as_deref(),
            Some("Semantic Scholar unavailable; showing OpenAlex results only.")
        );

        svc.search("fx", &cancel).await.unwrap();
        assert_eq!(svc.secondary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_both_failing_is_network_failure() {
        let (svc, _dir) = service(
            FakeIndex::failing("Semantic Scholar"),
            FakeIndex::failing("OpenAlex"),
            FakeFetcher(None),
        );
        let err = svc.search("fx", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure(ref m) if m == SEARCH_FAILED));
    }

    #[tokio::test]
    async fn test_cancelled_search() {
        let (svc, _dir) = service(
            FakeIndex::ok("Semantic Scholar", ss_papers()),
            FakeIndex::ok("OpenAlex", oa_papers()),
            FakeFetcher(None),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            svc.search("fx", &cancel).await,
            Err(Error::Cancelled(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_query() {
        let (svc, _dir) = service(
            FakeIndex::ok("Semantic Scholar", vec![]),
            FakeIndex::ok("OpenAlex", vec![]),
            FakeFetcher(None),
        );
        assert!(matches!(
            svc.search("   ", &CancellationToken::new()).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_add_to_library_names_uniquely() {
        let (svc, _dir) = service(
            FakeIndex::ok("Semantic Scholar", vec![]),
            FakeIndex::ok("OpenAlex", vec![]),
            FakeFetcher(Some(b"%PDF-1.7".to_vec())),
        );
        let cancel = CancellationToken::new();
        let mut p = paper("s1", 0, None, ResultSource::SemanticScholar);
        p.year = Some(2020);
        p.open_access_url = Some("https://example.org/p.pdf".into());

        let first = svc.add_to_library(&p, &cancel).await.unwrap();
        assert_eq!(first.name, "Doe - Paper s1 (2020).pdf");
        assert_eq!(first.size_bytes, 8);

        let second = svc.add_to_library(&p, &cancel).await.unwrap();
        assert_eq!(second.name, "Doe - Paper s1 (2020) (2).pdf");

        let outcome = SearchOutcome { query: "q".into(), papers: vec![p], note: None, cached: false };
        let views = svc.view(&outcome, SortKey::Relevance).unwrap();
        assert!(views[0].in_library);
    }

    #[tokio::test]
    async fn test_add_without_open_access() {
        let (svc, _dir) = service(
            FakeIndex::ok("Semantic Scholar", vec![]),
            FakeIndex::ok("OpenAlex", vec![]),
            FakeFetcher(None),
        );
        let cancel = CancellationToken::new();
        let mut p = paper("s1", 0, None, ResultSource::SemanticScholar);
        assert!(matches!(
            svc.add_to_library(&p, &cancel).await,
            Err(Error::InvalidInput(_))
        ));

        p.open_access_url = Some("https://example.org/missing.pdf".into());
        let err = svc.add_to_library(&p, &cancel).await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure(ref m) if m == FETCH_FAILED));
        assert!(svc.library_names().unwrap().is_empty());
    }
}
