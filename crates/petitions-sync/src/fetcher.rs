//! Cache-first GET with a courtesy pause after every live request.

use std::time::Duration;

use petitions_store::CacheStore;
use reqwest::Url;
use serde_json::Value;
use tracing::info;

use crate::http::{FetchError, Transport};

/// Pause after each live fetch.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_secs(1);

/// Counts of cache hits and live requests made through a [`CachedFetcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cache_hits: usize,
    pub live_fetches: usize,
}

/// Build the request URL: `url` with `params` appended in the given order.
pub fn request_url(url: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
    let mut parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if !params.is_empty() {
        parsed
            .query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(parsed)
}

/// Normalized identity of a request, used as the cache key.
///
/// Scheme, host, port and path as parsed, fragment dropped, and query
/// parameters sorted by name then value, so `?page=2&q=tree` and
/// `?q=tree&page=2` share an entry.
pub fn cache_key(request: &Url) -> String {
    let mut pairs: Vec<(String, String)> = request.query_pairs().into_owned().collect();
    pairs.sort();

    let mut key = request.clone();
    key.set_fragment(None);
    key.set_query(None);
    if !pairs.is_empty() {
        key.query_pairs_mut().extend_pairs(pairs);
    }
    key.to_string()
}

/// Idempotent GET: each distinct request hits the network at most once across
/// runs, after which its payload comes from the cache store.
pub struct CachedFetcher<T, S> {
    transport: T,
    store: S,
    delay: Duration,
    stats: FetchStats,
}

impl<T: Transport, S: CacheStore> CachedFetcher<T, S> {
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            delay: DEFAULT_FETCH_DELAY,
            stats: FetchStats::default(),
        }
    }

    /// Override the pause after live fetches.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Return the cached payload for this request, or fetch, persist and
    /// return it.
    ///
    /// A cache hit makes no network request and does not pause. A miss fails
    /// on any non-2xx status, writes the decoded payload durably, then sleeps
    /// for the configured delay before returning.
    pub async fn get_or_fetch(
        &mut self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        let request = request_url(url, params)?;
        let key = cache_key(&request);

        if let Some(payload) = self.store.get(&key)? {
            self.stats.cache_hits += 1;
            return Ok(payload);
        }

        let response = self.transport.get(&request).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: request.to_string(),
                status: response.status,
            });
        }
        let payload: Value =
            serde_json::from_slice(&response.body).map_err(|source| FetchError::Json {
                url: request.to_string(),
                source,
            })?;

        self.store.put(&key, &payload)?;
        self.stats.live_fetches += 1;
        info!(url = %request, "downloaded");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use petitions_store::{DirCacheStore, MemoryCacheStore};
    use serde_json::json;
    use std::time::Instant;
    use tempfile::TempDir;

    const LIST: &str = "https://petition.parliament.uk/petitions.json";

    fn params(q: &str, page: u32) -> Vec<(&'static str, String)> {
        vec![("q", q.to_string()), ("page", page.to_string())]
    }

    #[test]
    fn request_url_appends_params_in_order() {
        let url = request_url(LIST, &params("air pollution", 2)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://petition.parliament.uk/petitions.json?q=air+pollution&page=2"
        );
    }

    #[test]
    fn cache_key_ignores_param_order() {
        let a = request_url(LIST, &params("tree", 2)).unwrap();
        let b = request_url(LIST, &[("page", "2".to_string()), ("q", "tree".to_string())])
            .unwrap();
        assert_ne!(a.as_str(), b.as_str());
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(
            cache_key(&a),
            "https://petition.parliament.uk/petitions.json?page=2&q=tree"
        );
    }

    #[test]
    fn cache_key_merges_url_and_param_queries() {
        let inline = request_url(&format!("{LIST}?q=tree"), &[("page", "3".into())]).unwrap();
        let split = request_url(LIST, &params("tree", 3)).unwrap();
        assert_eq!(cache_key(&inline), cache_key(&split));
    }

    #[test]
    fn cache_key_without_query_has_no_question_mark() {
        let url = request_url("https://petition.parliament.uk/petitions/1.json#top", &[]).unwrap();
        assert_eq!(cache_key(&url), "https://petition.parliament.uk/petitions/1.json");
    }

    #[test]
    fn invalid_url_is_an_error() {
        let err = request_url("not a url", &[]).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn second_identical_call_is_served_from_cache() {
        let body = json!({"data": [{"id": 1}], "links": {"next": null}});
        let transport = FakeTransport::new().respond(
            "https://petition.parliament.uk/petitions.json?q=tree&page=1",
            body.clone(),
        );
        let mut fetcher = CachedFetcher::new(transport, MemoryCacheStore::new())
            .with_delay(Duration::ZERO);

        let first = fetcher.get_or_fetch(LIST, &params("tree", 1)).await.unwrap();
        let second = fetcher.get_or_fetch(LIST, &params("tree", 1)).await.unwrap();

        assert_eq!(first, body);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(fetcher.transport().requests().len(), 1);
        assert_eq!(
            fetcher.stats(),
            FetchStats {
                cache_hits: 1,
                live_fetches: 1
            }
        );
    }

    #[tokio::test]
    async fn cache_survives_a_new_fetcher() {
        let tmp = TempDir::new().unwrap();
        let url = "https://petition.parliament.uk/petitions/9.json";
        let body = json!({"data": {"attributes": {"signatures_by_constituency": []}}});

        let mut first = CachedFetcher::new(
            FakeTransport::new().respond(url, body.clone()),
            DirCacheStore::open(tmp.path()).unwrap(),
        )
        .with_delay(Duration::ZERO);
        first.get_or_fetch(url, &[]).await.unwrap();

        // A transport that knows nothing: any network access would 404.
        let mut second = CachedFetcher::new(
            FakeTransport::new(),
            DirCacheStore::open(tmp.path()).unwrap(),
        )
        .with_delay(Duration::ZERO);
        let cached = second.get_or_fetch(url, &[]).await.unwrap();

        assert_eq!(cached, body);
        assert!(second.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn non_success_status_fails_and_caches_nothing() {
        let url = "https://petition.parliament.uk/petitions/404.json";
        let mut fetcher = CachedFetcher::new(
            FakeTransport::new().respond_status(url, 500),
            MemoryCacheStore::new(),
        )
        .with_delay(Duration::ZERO);

        let err = fetcher.get_or_fetch(url, &[]).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert!(fetcher.store().is_empty());
    }

    #[tokio::test]
    async fn pauses_after_live_fetch_only() {
        let url = "https://petition.parliament.uk/petitions/1.json";
        let mut fetcher = CachedFetcher::new(
            FakeTransport::new().respond(url, json!({"ok": true})),
            MemoryCacheStore::new(),
        )
        .with_delay(Duration::from_millis(50));

        let start = Instant::now();
        fetcher.get_or_fetch(url, &[]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));

        let start = Instant::now();
        fetcher.get_or_fetch(url, &[]).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn invalid_json_body_is_an_error() {
        struct Garbage;
        #[async_trait::async_trait]
        impl Transport for Garbage {
            async fn get(&self, _url: &Url) -> Result<crate::HttpResponse, FetchError> {
                Ok(crate::HttpResponse {
                    status: 200,
                    body: b"<html>".to_vec(),
                })
            }
        }

        let mut fetcher =
            CachedFetcher::new(Garbage, MemoryCacheStore::new()).with_delay(Duration::ZERO);
        let err = fetcher
            .get_or_fetch("https://petition.parliament.uk/petitions.json", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Json { .. }));
    }
}
