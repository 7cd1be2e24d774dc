//! Configuration management for marquee crawler
//!
//! This module handles loading and validating configuration from environment
//! variables, TOML files, and built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::retry::RetryConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Pagination loop configuration
    pub crawl: CrawlConfig,

    /// Detail phase configuration
    pub detail: DetailConfig,

    /// Review phase configuration
    pub review: ReviewConfig,

    /// Output file locations
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// GraphQL endpoint
    pub base_url: String,

    /// Site origin, used for Origin/Referer headers and session bootstrap
    pub site_url: String,

    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Locale sent with every query
    pub locale: String,

    /// Primary country constraint for the catalog search
    pub origin_country: String,

    /// Persisted query hash for the catalog search
    pub catalog_query_hash: String,

    /// Persisted query hash for title reviews
    pub review_query_hash: String,

    /// Body marker identifying an anti-automation challenge page
    pub challenge_marker: String,
}

/// Pagination loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Delay between pages in milliseconds
    pub page_delay_ms: u64,

    /// Fixed backoff after a failed fetch in milliseconds
    pub retry_backoff_ms: u64,

    /// Retries allowed on one cursor before the phase gives up (None = unbounded)
    pub max_retries: Option<u32>,
}

/// Detail phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    /// Prefix of the canonical title page URL (the id and a slash are appended)
    pub title_url_base: String,

    /// Bounded wait for the embedded data marker, in seconds
    pub marker_timeout_secs: u64,

    /// First poll interval while waiting for the marker, in milliseconds;
    /// doubles after every poll
    pub marker_poll_ms: u64,

    /// Delay between titles in milliseconds
    pub item_delay_ms: u64,

    /// Checkpoint after every N processed titles
    pub checkpoint_interval: usize,

    /// Skip titles already present in the existing checkpoint
    pub resume: bool,
}

/// Review phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Delay between titles in milliseconds; three page delays when unset
    pub item_delay_ms: Option<u64>,

    /// Skip titles already present in the existing checkpoint
    pub resume: bool,
}

/// Output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Catalog checkpoint/output file
    pub catalog_path: PathBuf,

    /// Detail checkpoint/output file
    pub detail_path: PathBuf,

    /// Review checkpoint/output file
    pub review_path: PathBuf,

    /// Directory for per-title diagnostic dumps
    pub diagnostics_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://caching.graphql.imdb.com/"),
            site_url: String::from("https://www.imdb.com/"),
            user_agent: String::from(DEFAULT_USER_AGENT),
            request_timeout_secs: 10,
            locale: String::from("vi-VN"),
            origin_country: String::from("VN"),
            catalog_query_hash: String::from(
                "6842af47c3f1c43431ae23d394f3aa05ab840146b146a2666d4aa0dc346dc482",
            ),
            review_query_hash: String::from(
                "89aff4cd7503e060ff1dd5aba91885d8bac0f7a21aa1e1f781848a786a5bdc19",
            ),
            challenge_marker: String::from("challenge-container"),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 2000,
            retry_backoff_ms: 5000,
            max_retries: Some(20),
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            title_url_base: String::from("https://www.imdb.com/title/"),
            marker_timeout_secs: 10,
            marker_poll_ms: 500,
            item_delay_ms: 2000,
            checkpoint_interval: 5,
            resume: false,
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: None,
            resume: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("output/catalog.json"),
            detail_path: PathBuf::from("output/details.json"),
            review_path: PathBuf::from("output/reviews.json"),
            diagnostics_dir: PathBuf::from("error_logs"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            crawl: CrawlConfig::default(),
            detail: DetailConfig::default(),
            review: ReviewConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("MARQUEE_API_URL") {
            config.api.base_url = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_SITE_URL") {
            config.api.site_url = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_USER_AGENT") {
            config.api.user_agent = v;
        }
        if let Some(v) = env_parse("MARQUEE_REQUEST_TIMEOUT") {
            config.api.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_LOCALE") {
            config.api.locale = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_ORIGIN_COUNTRY") {
            config.api.origin_country = v;
        }

        if let Some(v) = env_parse("MARQUEE_PAGE_DELAY_MS") {
            config.crawl.page_delay_ms = v;
        }
        if let Some(v) = env_parse("MARQUEE_REVIEW_DELAY_MS") {
            config.review.item_delay_ms = Some(v);
        }
        if let Some(v) = env_parse("MARQUEE_RETRY_BACKOFF_MS") {
            config.crawl.retry_backoff_ms = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_MAX_RETRIES") {
            config.crawl.max_retries = if v.eq_ignore_ascii_case("unbounded") {
                None
            } else {
                Some(v.parse().context("MARQUEE_MAX_RETRIES must be a number or 'unbounded'")?)
            };
        }

        if let Some(v) = env_parse("MARQUEE_CHECKPOINT_INTERVAL") {
            config.detail.checkpoint_interval = v;
        }
        if let Some(v) = env_parse("MARQUEE_RESUME") {
            config.detail.resume = v;
            config.review.resume = v;
        }

        if let Ok(v) = std::env::var("MARQUEE_OUTPUT_DIR") {
            let dir = PathBuf::from(v);
            config.output.catalog_path = dir.join("catalog.json");
            config.output.detail_path = dir.join("details.json");
            config.output.review_path = dir.join("reviews.json");
        }
        if let Ok(v) = std::env::var("MARQUEE_DIAGNOSTICS_DIR") {
            config.output.diagnostics_dir = PathBuf::from(v);
        }

        if let Ok(v) = std::env::var("MARQUEE_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("MARQUEE_LOG_FORMAT") {
            config.logging.format = v;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("Invalid api.base_url: {}", self.api.base_url))?;
        url::Url::parse(&self.api.site_url)
            .with_context(|| format!("Invalid api.site_url: {}", self.api.site_url))?;
        url::Url::parse(&self.detail.title_url_base).with_context(|| {
            format!("Invalid detail.title_url_base: {}", self.detail.title_url_base)
        })?;

        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.api.catalog_query_hash.is_empty() || self.api.review_query_hash.is_empty() {
            anyhow::bail!("persisted query hashes must not be empty");
        }

        if self.api.challenge_marker.is_empty() {
            anyhow::bail!("challenge_marker must not be empty");
        }

        if self.detail.checkpoint_interval == 0 {
            anyhow::bail!("checkpoint_interval must be greater than 0");
        }

        if self.detail.marker_timeout_secs == 0 {
            anyhow::bail!("marker_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Get the inter-page delay as Duration
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.crawl.page_delay_ms)
    }

    /// Delay between titles in the review phase
    #[must_use]
    pub fn review_delay(&self) -> Duration {
        let ms = self
            .review
            .item_delay_ms
            .unwrap_or_else(|| self.crawl.page_delay_ms.saturating_mul(3));
        Duration::from_millis(ms)
    }

    /// Retry policy for the pagination loop
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::fixed(
            Duration::from_millis(self.crawl.retry_backoff_ms),
            self.crawl.max_retries,
        )
    }
}
