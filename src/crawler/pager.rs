//! Cursor pagination loop
//!
//! Drives a [`PageSource`] across pages until the API reports no more pages:
//!
//! ```text
//! START ──▶ FETCHING ──ok──▶ EXTRACTING ──has_more──▶ FETCHING
//!             │  ▲                 │
//!           error│                 └──no more──▶ DONE
//!             ▼  │
//!          RETRY_WAIT (same cursor)
//! ```
//!
//! The cursor only advances after a page has been extracted, so a failed
//! page is fetched again rather than skipped. Consecutive failures on one
//! cursor are capped by [`RetryConfig::max_retries`]; a challenge page asks
//! the [`SessionProvider`] for fresh cookies before the retry. An error that
//! is not recoverable (a rejected query) ends the run without retrying.

use serde_json::Value;
use std::time::Duration;

use crate::crawler::fetcher::{Page, PageSource};
use crate::crawler::query::PagedQuery;
use crate::models::CrawlStats;
use crate::error::MarqueeErrorTrait;
use crate::session::SessionProvider;
use crate::utils::error::{CrawlerError, FetchError, MalformedRecord};
use crate::utils::retry::RetryConfig;

/// Position of the loop in its state machine
#[derive(Debug)]
pub enum LoopState {
    Start,
    Fetching {
        cursor: Option<String>,
        failures: u32,
    },
    Extracting {
        cursor: Option<String>,
        page: Page,
    },
    RetryWait {
        cursor: Option<String>,
        failures: u32,
        error: FetchError,
    },
    Done,
}

/// Pagination loop with its record accumulator and counters
///
/// One loop can run several queries in sequence; records and counters keep
/// accumulating across runs.
pub struct CrawlLoop<'a, T> {
    source: &'a dyn PageSource,
    sessions: Option<&'a dyn SessionProvider>,
    retry: RetryConfig,
    page_delay: Duration,
    records: Vec<T>,
    stats: CrawlStats,
}

impl<'a, T> CrawlLoop<'a, T> {
    pub fn new(source: &'a dyn PageSource, retry: RetryConfig, page_delay: Duration) -> Self {
        Self {
            source,
            sessions: None,
            retry,
            page_delay,
            records: Vec::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Renew the session through `provider` when a challenge page is seen
    pub fn with_session_provider(mut self, provider: &'a dyn SessionProvider) -> Self {
        self.sessions = Some(provider);
        self
    }

    /// Start from records accumulated earlier
    pub fn with_records(mut self, records: Vec<T>) -> Self {
        self.records = records;
        self
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Drop records past `len`, e.g. the partial output of a failed run
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn into_parts(self) -> (Vec<T>, CrawlStats) {
        (self.records, self.stats)
    }

    /// Page through `query` until the API reports no more pages
    ///
    /// `extract` maps each edge to a record; rejected edges are counted and
    /// dropped. `on_page` sees the whole accumulator after each page.
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::RetriesExhausted` when one cursor fails more
    /// often than the retry policy allows, and `CrawlerError::Fetch` at once
    /// for an error retrying cannot fix. Records from earlier pages stay in
    /// the accumulator.
    pub async fn run<E, F>(
        &mut self,
        query: &PagedQuery,
        mut extract: E,
        mut on_page: F,
    ) -> Result<(), CrawlerError>
    where
        E: FnMut(&Value) -> Result<T, MalformedRecord>,
        F: FnMut(&[T]),
    {
        let mut state = LoopState::Start;
        let mut page_number = 0u64;

        loop {
            state = match state {
                LoopState::Start => LoopState::Fetching {
                    cursor: None,
                    failures: 0,
                },

                LoopState::Fetching { cursor, failures } => {
                    self.stats.fetch_calls += 1;
                    match self.source.fetch_page(query, cursor.as_deref()).await {
                        Ok(page) => {
                            self.stats.pages += 1;
                            LoopState::Extracting { cursor, page }
                        }
                        Err(error) => {
                            self.stats.fetch_failures += 1;
                            LoopState::RetryWait {
                                cursor,
                                failures: failures + 1,
                                error,
                            }
                        }
                    }
                }

                LoopState::RetryWait {
                    cursor,
                    failures,
                    error,
                } => {
                    if !error.is_recoverable() {
                        tracing::error!(
                            operation = query.operation_name(),
                            cursor = ?cursor,
                            error = %error,
                            "Page fetch failed permanently"
                        );
                        return Err(CrawlerError::Fetch(error));
                    }

                    if !self.retry.allows(failures) {
                        tracing::error!(
                            operation = query.operation_name(),
                            cursor = ?cursor,
                            attempts = failures,
                            error = %error,
                            "Retry limit reached"
                        );
                        return Err(CrawlerError::RetriesExhausted {
                            attempts: failures,
                            cursor,
                            last: error,
                        });
                    }

                    tracing::warn!(
                        operation = query.operation_name(),
                        cursor = ?cursor,
                        attempt = failures,
                        error = %error,
                        "Page fetch failed, retrying same cursor"
                    );

                    if error.is_session_invalid() {
                        self.renew_session().await;
                    }

                    tokio::time::sleep(self.retry.calculate_delay(failures)).await;
                    LoopState::Fetching { cursor, failures }
                }

                LoopState::Extracting { cursor, page } => {
                    page_number += 1;
                    let before = self.records.len();

                    for edge in &page.edges {
                        match extract(edge) {
                            Ok(record) => self.records.push(record),
                            Err(reason) => {
                                self.stats.malformed += 1;
                                tracing::debug!(reason = %reason, "Dropping malformed edge");
                            }
                        }
                    }

                    let kept = self.records.len() - before;
                    self.stats.edges += page.edges.len() as u64;
                    self.stats.records += kept as u64;

                    tracing::info!(
                        operation = query.operation_name(),
                        page = page_number,
                        edges = page.edges.len(),
                        kept,
                        total = self.records.len(),
                        has_next_page = page.has_more(),
                        "Page extracted"
                    );

                    on_page(&self.records);
                    tokio::time::sleep(self.page_delay).await;

                    match (page.has_more(), page.next_cursor()) {
                        (false, _) => LoopState::Done,
                        (true, Some(next)) => LoopState::Fetching {
                            cursor: Some(next.to_string()),
                            failures: 0,
                        },
                        (true, None) => {
                            tracing::warn!(
                                operation = query.operation_name(),
                                cursor = ?cursor,
                                "More pages reported without an end cursor, stopping"
                            );
                            LoopState::Done
                        }
                    }
                }

                LoopState::Done => return Ok(()),
            };
        }
    }

    async fn renew_session(&mut self) {
        let Some(provider) = self.sessions else {
            tracing::warn!("Challenge page detected but no session provider is configured");
            return;
        };

        tracing::warn!("Challenge page detected, renewing session");
        match provider.bootstrap().await {
            Ok(session) => {
                self.source.install_session(session).await;
                self.stats.session_renewals += 1;
            }
            Err(e) => tracing::warn!(error = %e, "Session renewal failed"),
        }
    }
}
