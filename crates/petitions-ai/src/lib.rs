//! Petition text classification: an OpenAI-compatible chat client, the prompt
//! and response format, and a batch classifier with a persistent verdict cache.

pub mod classifier;
pub mod config;
pub mod error;
pub mod prompt;
pub mod service;

#[cfg(test)]
mod testing;

pub use classifier::{BatchClassifier, ClassificationCache};
pub use config::{ClassifierConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, MAX_BATCH_SIZE};
pub use error::ClassifyError;
pub use prompt::{build_prompt, parse_response, strip_code_blocks};
pub use service::{CompletionService, OpenAiClient};
