//! Command-line arguments and the resolved build configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use petitions_ai::{ClassifierConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use petitions_core::DEFAULT_THRESHOLD;
use petitions_sync::DEFAULT_LIST_URL;

pub const PETITIONS_FILE: &str = "petitions.parquet";
pub const SIGNATURES_FILE: &str = "constituency_signatures.parquet";
pub const SIGNIFICANCE_FILE: &str = "constituency_signatures_with_significance.parquet";

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Search term for the petitions list endpoint (repeatable)
    #[arg(short, long = "keyword", value_name = "TERM", required = true)]
    pub keywords: Vec<String>,

    /// Petitions list endpoint
    #[arg(long, env = "PETITIONS_LIST_URL", default_value = DEFAULT_LIST_URL)]
    pub list_url: String,

    /// Petitions need more signatures than this to be classified and analysed
    #[arg(long, env = "PETITIONS_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u64,

    /// Pause after each live API request, in milliseconds
    #[arg(long, env = "PETITIONS_FETCH_DELAY_MS", default_value_t = 1000)]
    pub fetch_delay_ms: u64,

    /// Directory of cached API responses
    #[arg(long, env = "PETITIONS_CACHE_DIR", default_value = "data/interim/cache")]
    pub cache_dir: PathBuf,

    /// JSON file of cached classifier verdicts
    #[arg(
        long,
        env = "PETITIONS_CLASSIFICATION_CACHE",
        default_value = "data/interim/openai_cache.json"
    )]
    pub classification_cache: PathBuf,

    /// Directory the Parquet tables are written to
    #[arg(short, long, env = "PETITIONS_OUTPUT_DIR", default_value = "data/interim")]
    pub output_dir: PathBuf,

    /// Classification service API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Classification model
    #[arg(long, env = "PETITIONS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// OpenAI-compatible API root
    #[arg(long, env = "PETITIONS_API_BASE", default_value = DEFAULT_BASE_URL)]
    pub api_base: String,

    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    #[arg(long, default_value_t = 1024)]
    pub max_tokens: u32,

    /// Texts per classification request (1-10)
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Retries per batch after a malformed reply
    #[arg(long, default_value_t = 5)]
    pub max_retries: u32,

    /// Reclassify texts that already have a cached verdict
    #[arg(long)]
    pub ignore_cache: bool,
}

/// Everything the build pipeline needs, resolved from arguments and environment.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub keywords: Vec<String>,
    pub list_url: String,
    pub threshold: u64,
    pub fetch_delay: Duration,
    pub cache_dir: PathBuf,
    pub classification_cache: PathBuf,
    pub output_dir: PathBuf,
    pub classifier: ClassifierConfig,
}

impl From<BuildArgs> for BuildConfig {
    fn from(args: BuildArgs) -> Self {
        Self {
            keywords: args.keywords,
            list_url: args.list_url,
            threshold: args.threshold,
            fetch_delay: Duration::from_millis(args.fetch_delay_ms),
            cache_dir: args.cache_dir,
            classification_cache: args.classification_cache,
            output_dir: args.output_dir,
            classifier: ClassifierConfig {
                api_key: args.api_key,
                model: args.model,
                base_url: args.api_base,
                temperature: args.temperature,
                max_tokens: args.max_tokens,
                batch_size: args.batch_size,
                max_retries: args.max_retries,
                ignore_cache: args.ignore_cache,
            },
        }
    }
}

impl BuildConfig {
    pub fn petitions_path(&self) -> PathBuf {
        self.output_dir.join(PETITIONS_FILE)
    }

    pub fn signatures_path(&self) -> PathBuf {
        self.output_dir.join(SIGNATURES_FILE)
    }

    pub fn significance_path(&self) -> PathBuf {
        self.output_dir.join(SIGNIFICANCE_FILE)
    }
}
