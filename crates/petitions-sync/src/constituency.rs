//! Per-constituency signature breakdowns from each petition's detail URL.

use petitions_core::{ConstituencySignature, Petition, extract_constituency_signatures};
use petitions_store::CacheStore;
use tracing::info;

use crate::fetcher::CachedFetcher;
use crate::http::{FetchError, Transport};

/// Fetch the detail payload of each petition and flatten its
/// `signatures_by_constituency` list.
///
/// Rows come out grouped by petition in input order, with constituencies in
/// the order the API lists them.
pub async fn fetch_constituency_signatures<T: Transport, S: CacheStore>(
    fetcher: &mut CachedFetcher<T, S>,
    petitions: &[Petition],
) -> Result<Vec<ConstituencySignature>, FetchError> {
    let mut rows = Vec::new();
    for petition in petitions {
        let payload = fetcher.get_or_fetch(&petition.url, &[]).await?;
        rows.extend(extract_constituency_signatures(petition.id, &payload)?);
    }
    info!(
        petitions = petitions.len(),
        rows = rows.len(),
        "constituency breakdowns loaded"
    );
    Ok(rows)
}
