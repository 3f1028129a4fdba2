//! Fetch layer: HTTP transport, cache-backed rate-limited fetcher, listing
//! pagination, and per-petition constituency breakdowns.

pub mod constituency;
pub mod fetcher;
pub mod http;
pub mod pages;

#[cfg(test)]
mod testing;

pub use constituency::fetch_constituency_signatures;
pub use fetcher::{CachedFetcher, DEFAULT_FETCH_DELAY, FetchStats, cache_key, request_url};
pub use http::{FetchError, HttpResponse, ReqwestTransport, Transport};
pub use pages::{DEFAULT_LIST_URL, FetchReport, fetch_petitions, page_number};
pub use reqwest::Url;
