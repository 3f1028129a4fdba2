//! Batch classification with a persistent verdict cache.
//!
//! Texts without a cached verdict are sent to the service in batches of at
//! most [`MAX_BATCH_SIZE`](crate::MAX_BATCH_SIZE). A reply that does not parse
//! or has the wrong length is retried with the identical request, up to
//! `max_retries` times; each batch's verdicts are persisted before the next
//! batch is sent, so an interrupted run loses at most one batch of work.

use std::collections::{HashMap, HashSet};

use petitions_core::ClassificationResult;
use petitions_store::CacheStore;
use tracing::{info, warn};

use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::prompt::{build_prompt, parse_response};
use crate::service::{CompletionService, OpenAiClient};

/// Verdicts keyed by the exact text that was classified.
pub struct ClassificationCache<S> {
    store: S,
}

impl<S: CacheStore> ClassificationCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn get(&self, text: &str) -> Result<Option<ClassificationResult>, ClassifyError> {
        match self.store.get(text)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| ClassifyError::CorruptEntry {
                    text: text.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn put(&mut self, text: &str, result: &ClassificationResult) -> Result<(), ClassifyError> {
        let value = serde_json::to_value(result).map_err(|source| ClassifyError::CorruptEntry {
            text: text.to_string(),
            source,
        })?;
        Ok(self.store.put(text, &value)?)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub struct BatchClassifier<C, S> {
    service: C,
    cache: ClassificationCache<S>,
    batch_size: usize,
    max_retries: u32,
    ignore_cache: bool,
}

impl<S: CacheStore> BatchClassifier<OpenAiClient, S> {
    /// Classifier backed by the configured chat service.
    ///
    /// Fails with [`ClassifyError::Config`] before any request when no API key
    /// is set.
    pub fn from_config(config: &ClassifierConfig, store: S) -> Result<Self, ClassifyError> {
        let service = OpenAiClient::new(config)?;
        Ok(Self::with_service(service, store, config))
    }
}

impl<C: CompletionService, S: CacheStore> BatchClassifier<C, S> {
    pub fn with_service(service: C, store: S, config: &ClassifierConfig) -> Self {
        Self {
            service,
            cache: ClassificationCache::new(store),
            batch_size: config.effective_batch_size(),
            max_retries: config.max_retries,
            ignore_cache: config.ignore_cache,
        }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub fn cache(&self) -> &ClassificationCache<S> {
        &self.cache
    }

    /// Verdicts for `texts`, one per text, in input order.
    pub async fn classify(
        &mut self,
        texts: &[String],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let mut seen = HashSet::new();
        let mut verdicts: HashMap<&str, ClassificationResult> = HashMap::new();
        let mut pending: Vec<&str> = Vec::new();
        for text in texts.iter().map(String::as_str) {
            if !seen.insert(text) {
                continue;
            }
            if !self.ignore_cache {
                if let Some(cached) = self.cache.get(text)? {
                    verdicts.insert(text, cached);
                    continue;
                }
            }
            pending.push(text);
        }

        let batches = pending.len().div_ceil(self.batch_size);
        info!(
            requested = texts.len(),
            uncached = pending.len(),
            batches,
            "classifying"
        );

        for (i, batch) in pending.chunks(self.batch_size).enumerate() {
            let results = self.classify_batch(batch).await?;
            for (&text, result) in batch.iter().zip(results) {
                self.cache.put(text, &result)?;
                verdicts.insert(text, result);
            }
            info!(batch = i + 1, of = batches, size = batch.len(), "batch classified");
        }

        // Every distinct text is either cached or classified above.
        Ok(texts
            .iter()
            .filter_map(|text| verdicts.get(text.as_str()).cloned())
            .collect())
    }

    /// One batch, retrying the identical request on malformed replies.
    async fn classify_batch(
        &self,
        batch: &[&str],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let prompt = build_prompt(batch);
        let attempts = self.max_retries + 1;
        let mut problem = String::new();

        for attempt in 1..=attempts {
            let reply = self.service.complete(&prompt).await?;
            match parse_response(&reply, batch.len()) {
                Ok(results) => return Ok(results),
                Err(reason) => {
                    warn!(attempt, of = attempts, %reason, "malformed classification reply");
                    problem = reason;
                }
            }
        }

        Err(ClassifyError::Format {
            batch: batch.iter().map(|t| t.to_string()).collect(),
            attempts,
            message: problem,
        })
    }
}
