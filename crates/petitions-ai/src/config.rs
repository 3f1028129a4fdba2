//! Classifier settings.

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Largest batch sent in one request.
pub const MAX_BATCH_SIZE: usize = 10;

/// Settings for [`crate::OpenAiClient`] and [`crate::BatchClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Bearer credential. `None` or blank fails classifier construction.
    pub api_key: Option<String>,
    pub model: String,
    /// Root of the OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub batch_size: usize,
    /// Extra attempts per batch after a malformed response.
    pub max_retries: u32,
    /// Reclassify texts that already have a cached verdict.
    pub ignore_cache: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            batch_size: MAX_BATCH_SIZE,
            max_retries: 5,
            ignore_cache: false,
        }
    }
}

impl ClassifierConfig {
    /// Batch size clamped to `1..=MAX_BATCH_SIZE`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// The API key, if set and not blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.effective_batch_size(), 10);
        assert!(!config.ignore_cache);
        assert!(config.credential().is_none());
    }

    #[test]
    fn batch_size_is_clamped() {
        let mut config = ClassifierConfig::default();
        config.batch_size = 0;
        assert_eq!(config.effective_batch_size(), 1);
        config.batch_size = 50;
        assert_eq!(config.effective_batch_size(), 10);
        config.batch_size = 4;
        assert_eq!(config.effective_batch_size(), 4);
    }

    #[test]
    fn blank_key_is_no_credential() {
        let config = ClassifierConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(config.credential().is_none());

        let config = ClassifierConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        };
        assert_eq!(config.credential(), Some("sk-test"));
    }
}
