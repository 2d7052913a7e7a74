//! Configuration for the sync engine.

use std::env;
use std::time::Duration;

/// Tunables for debouncing, retrying and polling.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet window before a dirty collection is flushed
    pub debounce: Duration,
    /// Fixed delay between transient-failure retries
    pub retry_delay: Duration,
    /// Automatic retries per flush after the initial attempt
    pub max_retries: u32,
    /// Namespace prefix for local cache keys
    pub cache_prefix: String,
    /// Poll cadence of the HTTP subscription
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(2_000),
            retry_delay: Duration::from_millis(2_000),
            max_retries: 3,
            cache_prefix: "tally".to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = parse_ms("TALLY_SYNC_DEBOUNCE_MS")? {
            config.debounce = ms;
        }
        if let Some(ms) = parse_ms("TALLY_SYNC_RETRY_DELAY_MS")? {
            config.retry_delay = ms;
        }
        if let Ok(raw) = env::var("TALLY_SYNC_MAX_RETRIES") {
            config.max_retries = raw
                .parse()
                .map_err(|_| ConfigError::Invalid("TALLY_SYNC_MAX_RETRIES"))?;
        }
        if let Ok(prefix) = env::var("TALLY_SYNC_CACHE_PREFIX") {
            config.cache_prefix = prefix;
        }
        if let Some(ms) = parse_ms("TALLY_SYNC_POLL_INTERVAL_MS")? {
            config.poll_interval = ms;
        }

        Ok(config)
    }
}

fn parse_ms(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            let ms: u64 = raw.parse().map_err(|_| ConfigError::Invalid(name))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    Invalid(&'static str),
}
