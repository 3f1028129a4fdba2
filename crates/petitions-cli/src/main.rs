mod build;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use petitions_ai::BatchClassifier;
use petitions_store::{DirCacheStore, JsonFileCacheStore};
use petitions_sync::{CachedFetcher, ReqwestTransport};

use crate::config::{BuildArgs, BuildConfig};

#[derive(Parser)]
#[command(name = "petitions", version, about = "UK Parliament petitions: fetch, classify, analyse")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch petitions for the given terms, classify them, and write the
    /// petitions, constituency signatures and significance tables
    Build(BuildArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("petitions v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => cmd_build(args.into()).await,
    }
}

async fn cmd_build(config: BuildConfig) -> anyhow::Result<()> {
    // Credential check comes first so a misconfigured run makes no requests.
    let verdicts = JsonFileCacheStore::open(&config.classification_cache).with_context(|| {
        format!(
            "opening classification cache {}",
            config.classification_cache.display()
        )
    })?;
    let mut classifier = BatchClassifier::from_config(&config.classifier, verdicts)
        .context("configuring classifier")?;

    let store = DirCacheStore::open(&config.cache_dir)
        .with_context(|| format!("opening cache {}", config.cache_dir.display()))?;
    let mut fetcher =
        CachedFetcher::new(ReqwestTransport::new(), store).with_delay(config.fetch_delay);

    let stats = build::run_build(&config, &mut fetcher, &mut classifier).await?;
    let fetch = fetcher.stats();

    eprintln!(
        "  {} listing records, {} unique petitions, {} over {} signatures ({} environmental)",
        stats.discovered, stats.unique, stats.qualifying, config.threshold, stats.environmental
    );
    eprintln!(
        "  {} constituency rows, {} of {} cells significant (chi2 = {:.1}, dof = {}, p = {:.3e})",
        stats.constituency_rows,
        stats.significant,
        stats.residual_rows,
        stats.chi_square.statistic,
        stats.chi_square.degrees_of_freedom,
        stats.chi_square.p_value
    );
    eprintln!(
        "  {} live requests, {} cache hits, {:.1}s",
        fetch.live_fetches, fetch.cache_hits, stats.elapsed_secs
    );
    eprintln!("  Output: {}", config.output_dir.display());
    Ok(())
}
