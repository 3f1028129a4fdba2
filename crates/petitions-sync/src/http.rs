//! HTTP transport for the petitions API.

use async_trait::async_trait;
use petitions_core::ExtractionError;
use petitions_store::StoreError;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned invalid JSON: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
    #[error("{url} returned an unexpected payload: {message}")]
    Payload { url: String, message: String },
    #[error("invalid request URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("search term {term:?}: next link {link:?} does not advance past page {page}")]
    Pagination { term: String, link: String, page: u32 },
    #[error("search term {term:?}: {source}")]
    Listing {
        term: String,
        source: ExtractionError,
    },
    #[error(transparent)]
    Detail(#[from] ExtractionError),
    #[error("cache error: {0}")]
    Store(#[from] StoreError),
}

/// Status and raw body of a completed GET.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Implemented over `reqwest` for real runs and by
/// scripted fakes in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        debug!(url = %url, "GET");
        let http_err = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };
        let resp = self.client.get(url.clone()).send().await.map_err(http_err)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(http_err)?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
