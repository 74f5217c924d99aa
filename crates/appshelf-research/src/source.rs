//! Seams for the paper indexes and the PDF download.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use appshelf_core::{Error, Result};

/// Results requested from each index.
pub const RESULT_LIMIT: usize = 20;

/// A searchable paper index.
pub trait PaperIndex: Send + Sync {
    fn name(&self) -> &'static str;
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<crate::Paper>>> + Send;
}

/// Downloads an open-access PDF.
pub trait PdfFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Shared HTTP client with the configured timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("appshelf/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("HTTP client: {}", e)))
}

pub(crate) fn network_err(source: &str, e: reqwest::Error) -> Error {
    Error::NetworkFailure(format!("{}: {}", source, e))
}

/// PDF download over plain HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PdfFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_err("PDF download", e))?;
        if !response.status().is_success() {
            return Err(Error::NetworkFailure(format!(
                "PDF download returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_err("PDF download", e))?;
        Ok(bytes.to_vec())
    }
}
