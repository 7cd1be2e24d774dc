//! Detail phase
//!
//! For each catalog record, load the rendered title page, read its embedded
//! data and merge it over the record. Titles that fail are skipped; the
//! batch never aborts on one title. Extraction failures leave a diagnostic
//! snapshot behind.
//!
//! The page source is held for the whole batch and closed when the batch
//! ends, whether or not it succeeded.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::headers::build_page_headers;
use crate::config::{ApiConfig, Config, DetailConfig};
use crate::models::{CatalogRecord, DetailRecord, DetailStats, PhaseOutput, TitleKeyed};
use crate::parser::detail::has_next_data;
use crate::parser::{extract_next_data, merge_detail, parse_title_sections, ScrapedTitle};
use crate::session::Session;
use crate::storage::{Checkpoint, DetailDiagnostic, DiagnosticsWriter};
use crate::utils::error::{CrawlerError, DetailError, FetchError};

/// Navigable source of rendered title pages
#[async_trait]
pub trait DetailSource: Send {
    /// Navigate to the title's page and wait for the embedded data marker
    async fn load(&mut self, title_id: &str) -> Result<(), DetailError>;

    /// Markup of the page last loaded, complete or not
    fn current_markup(&self) -> &str;

    /// Release the underlying resources
    async fn close(&mut self);
}

/// [`DetailSource`] that loads pages over plain HTTP
///
/// A page still rendering (200 without the marker) or a challenge page is
/// re-requested, with the interval doubling each time, until the marker
/// script is present or the bounded wait expires. Any other error status
/// fails the load at once.
pub struct HttpDetailSource {
    client: Client,
    title_url_base: String,
    user_agent: String,
    locale: String,
    challenge_marker: String,
    session: Session,
    marker_timeout: Duration,
    poll_interval: Duration,
    markup: String,
}

impl HttpDetailSource {
    /// # Errors
    ///
    /// Returns `CrawlerError::Fetch` if the HTTP client cannot be created
    pub fn new(api: &ApiConfig, detail: &DetailConfig) -> Result<Self, CrawlerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.request_timeout_secs))
            .gzip(true)
            .build()
            .map_err(FetchError::from)?;

        Ok(Self {
            client,
            title_url_base: detail.title_url_base.clone(),
            user_agent: api.user_agent.clone(),
            locale: api.locale.clone(),
            challenge_marker: api.challenge_marker.clone(),
            session: Session::new(),
            marker_timeout: Duration::from_secs(detail.marker_timeout_secs),
            poll_interval: Duration::from_millis(detail.marker_poll_ms),
            markup: String::new(),
        })
    }

    /// Send these cookies with every page request
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn title_url(&self, title_id: &str) -> String {
        format!("{}{}/", self.title_url_base, title_id)
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn load(&mut self, title_id: &str) -> Result<(), DetailError> {
        let url = self.title_url(title_id);
        let headers = build_page_headers(&self.user_agent, &self.locale, &self.session);
        let deadline = Instant::now() + self.marker_timeout;
        let mut interval = self.poll_interval;
        self.markup.clear();

        loop {
            tracing::debug!(title_id = %title_id, url = %url, "Loading title page");

            let response = self
                .client
                .get(&url)
                .headers(headers.clone())
                .send()
                .await
                .map_err(|e| DetailError::Load(e.to_string()))?;
            let status = response.status();
            self.markup = response
                .text()
                .await
                .map_err(|e| DetailError::Load(e.to_string()))?;

            if status.is_success() {
                if has_next_data(&self.markup) {
                    return Ok(());
                }
            } else if !self.markup.contains(&self.challenge_marker) {
                tracing::debug!(title_id = %title_id, status = status.as_u16(), "Title page failed");
                return Err(DetailError::Load(format!("status {}", status.as_u16())));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(title_id = %title_id, status = status.as_u16(), "Marker wait expired");
                return Err(DetailError::MarkerTimeout(self.marker_timeout));
            }

            tokio::time::sleep(interval.min(remaining)).await;
            interval = interval.saturating_mul(2);
        }
    }

    fn current_markup(&self) -> &str {
        &self.markup
    }

    async fn close(&mut self) {
        self.markup.clear();
        tracing::debug!("Detail source closed");
    }
}

/// Whatever was parsed before a title failed
#[derive(Debug, Default)]
struct Partial {
    next_data: Option<Value>,
    above_the_fold: Option<Value>,
}

/// Phase 2: enrich catalog records from their title pages
pub struct DetailEnricher<S: DetailSource> {
    source: S,
    diagnostics: DiagnosticsWriter,
    checkpoint_interval: usize,
    item_delay: Duration,
    resume: bool,
}

impl<S: DetailSource> DetailEnricher<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            diagnostics: DiagnosticsWriter::new(&config.output.diagnostics_dir),
            checkpoint_interval: config.detail.checkpoint_interval.max(1),
            item_delay: Duration::from_millis(config.detail.item_delay_ms),
            resume: config.detail.resume,
        }
    }

    /// Enrich every record in `catalog`
    ///
    /// Checkpoints after every `checkpoint_interval` titles and once at the
    /// end. The source is closed before returning.
    ///
    /// # Errors
    ///
    /// Only a failure to read the existing checkpoint when resuming is an
    /// error; per-title failures are counted and skipped.
    pub async fn run(
        mut self,
        catalog: &[CatalogRecord],
        checkpoint: &mut dyn Checkpoint<DetailRecord>,
    ) -> Result<PhaseOutput<DetailRecord, DetailStats>, CrawlerError> {
        let result = self.process(catalog, checkpoint).await;
        self.source.close().await;
        result
    }

    async fn process(
        &mut self,
        catalog: &[CatalogRecord],
        checkpoint: &mut dyn Checkpoint<DetailRecord>,
    ) -> Result<PhaseOutput<DetailRecord, DetailStats>, CrawlerError> {
        let mut stats = DetailStats::default();
        let mut records = if self.resume {
            checkpoint.load()?
        } else {
            Vec::new()
        };

        let done: HashSet<String> = records.iter().map(|r| r.title_id().to_string()).collect();
        let pending: Vec<&CatalogRecord> = catalog
            .iter()
            .filter(|r| !done.contains(&r.id))
            .collect();
        stats.resumed = (catalog.len() - pending.len()) as u64;

        tracing::info!(
            total = catalog.len(),
            pending = pending.len(),
            resumed = stats.resumed,
            "Starting detail enrichment"
        );

        for (idx, record) in pending.iter().enumerate() {
            let idx = idx + 1;

            if record.id.trim().is_empty() {
                stats.skipped += 1;
                tracing::debug!(index = idx, "Skipping catalog record without id");
            } else {
                stats.processed += 1;
                tracing::info!(index = idx, total = pending.len(), title_id = %record.id, "Enriching title");

                let mut partial = Partial::default();
                match self.enrich(record, &mut partial).await {
                    Ok(detail) => {
                        tracing::info!(
                            title_id = %detail.id,
                            name = %detail.name,
                            year = ?detail.year,
                            "Title enriched"
                        );
                        records.push(detail);
                        stats.enriched += 1;
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::warn!(title_id = %record.id, error = %e, "Skipping title");
                        if e.wants_diagnostics() {
                            self.write_diagnostic(&record.id, &e, partial);
                        }
                    }
                }
            }

            if idx % self.checkpoint_interval == 0 {
                super::save_checkpoint(checkpoint, &records, "detail");
                stats.checkpoints += 1;
                tracing::info!(saved = records.len(), processed = idx, "Detail progress saved");
            }

            tokio::time::sleep(self.item_delay).await;
        }

        super::save_checkpoint(checkpoint, &records, "detail");
        stats.checkpoints += 1;

        tracing::info!(
            enriched = stats.enriched,
            failed = stats.failed,
            skipped = stats.skipped,
            resumed = stats.resumed,
            total = records.len(),
            "Detail enrichment completed"
        );

        Ok(PhaseOutput { records, stats })
    }

    async fn enrich(
        &mut self,
        record: &CatalogRecord,
        partial: &mut Partial,
    ) -> Result<DetailRecord, DetailError> {
        self.source.load(&record.id).await?;

        let next_data = extract_next_data(self.source.current_markup())?
            .ok_or(DetailError::MarkerMissing)?;
        let sections = parse_title_sections(&next_data);
        partial.next_data = Some(next_data);

        let sections = sections?;
        partial.above_the_fold = Some(sections.above_the_fold.clone());

        let scraped = ScrapedTitle::from_sections(&sections)?;
        merge_detail(record, scraped, Utc::now()).map_err(DetailError::Incomplete)
    }

    fn write_diagnostic(&self, title_id: &str, error: &DetailError, partial: Partial) {
        let diagnostic = DetailDiagnostic {
            error: error.to_string(),
            page_source: self.source.current_markup().to_string(),
            next_data: partial.next_data,
            above_the_fold: partial.above_the_fold,
        };
        self.diagnostics.write(title_id, &diagnostic);
    }
}
