//! Catalog phase
//!
//! Pages through the title search and checkpoints the accumulated catalog
//! after every page. The phase always starts from the first page.

use std::time::Duration;

use super::fetcher::PageSource;
use super::pager::CrawlLoop;
use super::query::PagedQuery;
use super::{bootstrap_session, save_checkpoint};
use crate::config::Config;
use crate::models::{CatalogRecord, CrawlStats, PhaseOutput};
use crate::parser::extract_catalog_record;
use crate::session::SessionProvider;
use crate::storage::Checkpoint;
use crate::utils::error::CrawlerError;
use crate::utils::retry::RetryConfig;

/// Phase 1: the title catalog
pub struct CatalogCrawler<'a> {
    source: &'a dyn PageSource,
    sessions: &'a dyn SessionProvider,
    query: PagedQuery,
    retry: RetryConfig,
    page_delay: Duration,
}

impl<'a> CatalogCrawler<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        sessions: &'a dyn SessionProvider,
        config: &Config,
    ) -> Self {
        Self {
            source,
            sessions,
            query: PagedQuery::catalog(&config.api),
            retry: config.retry(),
            page_delay: config.page_delay(),
        }
    }

    /// Crawl the whole catalog
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::RetriesExhausted` if a page keeps failing, or
    /// `CrawlerError::Fetch` if the API rejects the query; the checkpoint
    /// then holds every page extracted before it.
    pub async fn run(
        &self,
        checkpoint: &mut dyn Checkpoint<CatalogRecord>,
    ) -> Result<PhaseOutput<CatalogRecord, CrawlStats>, CrawlerError> {
        tracing::info!(operation = self.query.operation_name(), "Starting catalog crawl");
        bootstrap_session(self.sessions, self.source).await;

        let mut crawl = CrawlLoop::new(self.source, self.retry.clone(), self.page_delay)
            .with_session_provider(self.sessions);

        let result = crawl
            .run(&self.query, extract_catalog_record, |records| {
                save_checkpoint(&mut *checkpoint, records, "catalog");
            })
            .await;

        let (records, stats) = crawl.into_parts();
        result?;

        tracing::info!(
            records = records.len(),
            pages = stats.pages,
            malformed = stats.malformed,
            fetch_failures = stats.fetch_failures,
            session_renewals = stats.session_renewals,
            "Catalog crawl completed"
        );

        Ok(PhaseOutput { records, stats })
    }
}
