//! Paginated search over the petitions list endpoint.

use petitions_core::{Petition, extract_petition};
use petitions_store::CacheStore;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::fetcher::CachedFetcher;
use crate::http::{FetchError, Transport};

pub const DEFAULT_LIST_URL: &str = "https://petition.parliament.uk/petitions.json";

#[derive(Deserialize)]
struct ListPage {
    data: Vec<Value>,
    #[serde(default)]
    links: ListLinks,
}

#[derive(Deserialize, Default)]
struct ListLinks {
    #[serde(default)]
    next: Option<String>,
}

/// Per-term record counts from a [`fetch_petitions`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// `(term, records returned)` in the order terms were searched.
    pub per_term: Vec<(String, usize)>,
    /// Pages read across all terms, cached or live.
    pub pages: usize,
}

impl FetchReport {
    pub fn total_records(&self) -> usize {
        self.per_term.iter().map(|(_, n)| n).sum()
    }
}

/// The `page` query parameter of a `links.next` URL.
pub fn page_number(link: &str) -> Option<u32> {
    let url = Url::parse(link).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

/// Search the list endpoint for every term, following `links.next` until it
/// is null, missing or empty.
///
/// Blank terms are skipped. Records from all terms are concatenated in
/// fetch order, so a petition matching several terms appears once per term;
/// callers dedupe afterwards.
pub async fn fetch_petitions<T: Transport, S: CacheStore>(
    fetcher: &mut CachedFetcher<T, S>,
    list_url: &str,
    terms: &[String],
) -> Result<(Vec<Petition>, FetchReport), FetchError> {
    let mut petitions = Vec::new();
    let mut report = FetchReport::default();

    for term in terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let before = petitions.len();
        let mut page: u32 = 1;

        loop {
            let params = [("q", term.to_string()), ("page", page.to_string())];
            let payload = fetcher.get_or_fetch(list_url, &params).await?;
            let listing = ListPage::deserialize(&payload).map_err(|e| FetchError::Payload {
                url: list_url.to_string(),
                message: format!("q={term} page={page}: {e}"),
            })?;
            report.pages += 1;
            debug!(term, page, records = listing.data.len(), "list page");

            for raw in &listing.data {
                let petition = extract_petition(raw).map_err(|source| FetchError::Listing {
                    term: term.to_string(),
                    source,
                })?;
                petitions.push(petition);
            }

            let Some(link) = listing.links.next.filter(|l| !l.is_empty()) else {
                break;
            };
            match page_number(&link) {
                Some(next) if next > page => page = next,
                _ => {
                    return Err(FetchError::Pagination {
                        term: term.to_string(),
                        link,
                        page,
                    });
                }
            }
        }

        let found = petitions.len() - before;
        info!(term, records = found, "search complete");
        report.per_term.push((term.to_string(), found));
    }

    Ok((petitions, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use petitions_core::dedup_by_id;
    use petitions_store::MemoryCacheStore;
    use serde_json::json;
    use std::time::Duration;

    fn record(id: u64, signatures: u64) -> Value {
        json!({
            "type": "petition",
            "id": id,
            "links": { "self": format!("https://petition.parliament.uk/petitions/{id}.json") },
            "attributes": {
                "action": format!("Petition {id}"),
                "background": "Background.",
                "additional_details": null,
                "state": "open",
                "signature_count": signatures,
                "created_at": "2022-05-01T09:00:00.000Z",
                "government_response": null,
                "debate": null
            }
        })
    }

    fn page_url(term: &str, page: u32) -> String {
        format!("{DEFAULT_LIST_URL}?q={term}&page={page}")
    }

    fn next_link(term: &str, page: u32) -> String {
        format!("{DEFAULT_LIST_URL}?page={page}&q={term}")
    }

    fn fetcher(transport: FakeTransport) -> CachedFetcher<FakeTransport, MemoryCacheStore> {
        CachedFetcher::new(transport, MemoryCacheStore::new()).with_delay(Duration::ZERO)
    }

    #[test]
    fn reads_page_parameter() {
        assert_eq!(page_number(&next_link("tree", 3)), Some(3));
        assert_eq!(page_number(DEFAULT_LIST_URL), None);
        assert_eq!(page_number("not a url"), None);
    }

    #[tokio::test]
    async fn single_page_makes_one_request() {
        let transport = FakeTransport::new().respond(
            &page_url("peat", 1),
            json!({ "data": [record(1, 50)], "links": { "next": null } }),
        );
        let mut f = fetcher(transport);

        let (petitions, report) = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["peat".into()])
            .await
            .unwrap();

        assert_eq!(petitions.len(), 1);
        assert_eq!(f.transport().requests(), vec![page_url("peat", 1)]);
        assert_eq!(report.pages, 1);
        assert_eq!(report.per_term, vec![("peat".to_string(), 1)]);
    }

    #[tokio::test]
    async fn empty_next_link_ends_the_search() {
        let transport = FakeTransport::new().respond(
            &page_url("peat", 1),
            json!({ "data": [record(1, 50)], "links": { "next": "" } }),
        );
        let mut f = fetcher(transport);

        let (petitions, report) = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["peat".into()])
            .await
            .unwrap();

        assert_eq!(petitions.len(), 1);
        assert_eq!(f.transport().requests(), vec![page_url("peat", 1)]);
        assert_eq!(report.pages, 1);
    }

    #[tokio::test]
    async fn follows_next_links_to_the_end() {
        let transport = FakeTransport::new()
            .respond(
                &page_url("tree", 1),
                json!({ "data": [record(1, 10), record(2, 20)], "links": { "next": next_link("tree", 2) } }),
            )
            .respond(
                &page_url("tree", 2),
                json!({ "data": [record(3, 30)], "links": { "next": next_link("tree", 3) } }),
            )
            .respond(
                &page_url("tree", 3),
                json!({ "data": [], "links": { "next": null } }),
            );
        let mut f = fetcher(transport);

        let (petitions, report) = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["tree".into()])
            .await
            .unwrap();

        let ids: Vec<u64> = petitions.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(report.pages, 3);
        assert_eq!(f.transport().requests().len(), 3);
    }

    #[tokio::test]
    async fn overlapping_terms_dedupe_to_one_record() {
        let transport = FakeTransport::new()
            .respond(
                &page_url("tree", 1),
                json!({ "data": [record(42, 5000), record(7, 10)], "links": { "next": null } }),
            )
            .respond(
                &page_url("forest", 1),
                json!({ "data": [record(42, 5000)], "links": { "next": null } }),
            );
        let mut f = fetcher(transport);
        let terms = vec!["tree".to_string(), "forest".to_string()];

        let (petitions, report) = fetch_petitions(&mut f, DEFAULT_LIST_URL, &terms)
            .await
            .unwrap();
        assert_eq!(petitions.len(), 3);
        assert_eq!(report.total_records(), 3);

        let unique = dedup_by_id(petitions);
        let ids: Vec<u64> = unique.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![42, 7]);
    }

    #[tokio::test]
    async fn blank_terms_are_skipped() {
        let mut f = fetcher(FakeTransport::new());
        let terms = vec!["  ".to_string(), String::new()];

        let (petitions, report) = fetch_petitions(&mut f, DEFAULT_LIST_URL, &terms)
            .await
            .unwrap();
        assert!(petitions.is_empty());
        assert!(report.per_term.is_empty());
        assert!(f.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn repeated_run_is_served_from_cache() {
        let transport = FakeTransport::new().respond(
            &page_url("peat", 1),
            json!({ "data": [record(1, 50)], "links": { "next": null } }),
        );
        let mut f = fetcher(transport);
        let terms = vec!["peat".to_string()];

        fetch_petitions(&mut f, DEFAULT_LIST_URL, &terms).await.unwrap();
        fetch_petitions(&mut f, DEFAULT_LIST_URL, &terms).await.unwrap();

        assert_eq!(f.transport().requests().len(), 1);
        assert_eq!(f.stats().cache_hits, 1);
    }

    #[tokio::test]
    async fn non_advancing_next_link_is_an_error() {
        let transport = FakeTransport::new().respond(
            &page_url("loop", 1),
            json!({ "data": [], "links": { "next": next_link("loop", 1) } }),
        );
        let mut f = fetcher(transport);

        let err = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["loop".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Pagination { page: 1, .. }));
    }

    #[tokio::test]
    async fn malformed_record_names_the_term() {
        let transport = FakeTransport::new().respond(
            &page_url("bad", 1),
            json!({ "data": [{ "id": 9 }], "links": { "next": null } }),
        );
        let mut f = fetcher(transport);

        let err = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["bad".into()])
            .await
            .unwrap_err();
        match err {
            FetchError::Listing { term, .. } => assert_eq!(term, "bad"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_page_request_propagates() {
        let transport = FakeTransport::new().respond_status(&page_url("down", 1), 503);
        let mut f = fetcher(transport);

        let err = fetch_petitions(&mut f, DEFAULT_LIST_URL, &["down".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }
}
