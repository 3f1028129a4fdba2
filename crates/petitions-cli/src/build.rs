//! Build pipeline: search listings, classify, fetch constituency breakdowns,
//! test significance, write Parquet.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Context;
use petitions_ai::{BatchClassifier, CompletionService};
use petitions_core::schema::{constituency_signatures_batch, petitions_batch, residuals_batch};
use petitions_core::{
    ChiAnalysis, ChiSquareSummary, ClassifiedPetition, ContingencyTable, dedup_by_id, qualifying,
};
use petitions_store::{CacheStore, write_parquet};
use petitions_sync::{CachedFetcher, Transport, fetch_constituency_signatures, fetch_petitions};
use tracing::info;

use crate::config::BuildConfig;

pub struct BuildStats {
    pub discovered: usize,
    pub unique: usize,
    pub qualifying: usize,
    pub environmental: usize,
    pub constituency_rows: usize,
    pub residual_rows: usize,
    pub significant: usize,
    pub chi_square: ChiSquareSummary,
    pub elapsed_secs: f64,
}

/// Run every stage in order. Any failure aborts the run; the fetch and
/// classification caches keep whatever was completed.
pub async fn run_build<T, S, C, K>(
    config: &BuildConfig,
    fetcher: &mut CachedFetcher<T, S>,
    classifier: &mut BatchClassifier<C, K>,
) -> anyhow::Result<BuildStats>
where
    T: Transport,
    S: CacheStore,
    C: CompletionService,
    K: CacheStore,
{
    let start = Instant::now();

    // 1. Listings for every search term, merged by id.
    let (found, report) = fetch_petitions(fetcher, &config.list_url, &config.keywords)
        .await
        .context("fetching petition listings")?;
    let discovered = report.total_records();
    let unique = dedup_by_id(found);
    let selected = qualifying(&unique, config.threshold);
    info!(
        discovered,
        unique = unique.len(),
        qualifying = selected.len(),
        threshold = config.threshold,
        "petitions selected"
    );

    // 2. Classify the qualifying petitions.
    let texts: Vec<String> = selected.iter().map(|p| p.classification_text()).collect();
    let verdicts = classifier
        .classify(&texts)
        .await
        .context("classifying petitions")?;
    let by_id: HashMap<u64, _> = selected
        .iter()
        .map(|p| p.id)
        .zip(verdicts)
        .collect();
    let environmental = by_id.values().filter(|v| v.is_environmental).count();

    let rows: Vec<ClassifiedPetition> = unique
        .into_iter()
        .map(|petition| {
            let classification = by_id.get(&petition.id).cloned();
            ClassifiedPetition {
                petition,
                classification,
            }
        })
        .collect();

    // 3. Constituency breakdowns.
    let signatures = fetch_constituency_signatures(fetcher, &selected)
        .await
        .context("fetching constituency breakdowns")?;

    // 4. Significance over the petition x constituency table.
    let analysis = ChiAnalysis::new(ContingencyTable::from_signatures(&signatures));
    let chi_square = analysis.summary();
    let residuals = analysis.records();
    let significant = residuals.iter().filter(|r| r.significant).count();
    info!(
        statistic = chi_square.statistic,
        p_value = chi_square.p_value,
        dof = chi_square.degrees_of_freedom,
        significant,
        interesting_regions = analysis.interesting_regions().len(),
        "chi-square test"
    );

    // 5. Output tables.
    let batch = petitions_batch(&rows).context("building petitions table")?;
    write_parquet(&config.petitions_path(), &batch)
        .with_context(|| format!("writing {}", config.petitions_path().display()))?;

    let batch = constituency_signatures_batch(&signatures)
        .context("building constituency signatures table")?;
    write_parquet(&config.signatures_path(), &batch)
        .with_context(|| format!("writing {}", config.signatures_path().display()))?;

    let batch = residuals_batch(&residuals).context("building significance table")?;
    write_parquet(&config.significance_path(), &batch)
        .with_context(|| format!("writing {}", config.significance_path().display()))?;

    Ok(BuildStats {
        discovered,
        unique: rows.len(),
        qualifying: selected.len(),
        environmental,
        constituency_rows: signatures.len(),
        residual_rows: residuals.len(),
        significant,
        chi_square,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
