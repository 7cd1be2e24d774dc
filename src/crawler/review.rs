//! Review phase
//!
//! Titles are visited one after another; each title's reviews are paged
//! through with the same loop as the catalog. The accumulator spans the
//! whole run and is checkpointed after each title.

use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;

use super::fetcher::PageSource;
use super::pager::CrawlLoop;
use super::query::PagedQuery;
use super::{bootstrap_session, save_checkpoint};
use crate::config::{ApiConfig, Config};
use crate::models::{PhaseOutput, ReviewRecord, ReviewStats, TitleKeyed};
use crate::parser::{extract_review, ReviewParent};
use crate::session::SessionProvider;
use crate::storage::Checkpoint;
use crate::utils::error::CrawlerError;
use crate::utils::retry::RetryConfig;

/// Phase 3: user reviews per title
pub struct ReviewCrawler<'a> {
    source: &'a dyn PageSource,
    sessions: &'a dyn SessionProvider,
    api: ApiConfig,
    retry: RetryConfig,
    page_delay: Duration,
    item_delay: Duration,
    resume: bool,
}

impl<'a> ReviewCrawler<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        sessions: &'a dyn SessionProvider,
        config: &Config,
    ) -> Self {
        Self {
            source,
            sessions,
            api: config.api.clone(),
            retry: config.retry(),
            page_delay: config.page_delay(),
            item_delay: config.review_delay(),
            resume: config.review.resume,
        }
    }

    /// Crawl reviews for every title in `titles`
    ///
    /// A title whose pages keep failing is logged and skipped; its partial
    /// reviews are discarded so a resumed run fetches it again.
    ///
    /// # Errors
    ///
    /// Only a failure to read the existing checkpoint when resuming is an
    /// error.
    pub async fn run(
        &self,
        titles: &[ReviewParent],
        checkpoint: &mut dyn Checkpoint<ReviewRecord>,
    ) -> Result<PhaseOutput<ReviewRecord, ReviewStats>, CrawlerError> {
        let mut stats = ReviewStats::default();
        let existing = if self.resume {
            checkpoint.load()?
        } else {
            Vec::new()
        };

        let done: HashSet<String> = existing.iter().map(|r| r.title_id().to_string()).collect();
        let pending: Vec<&ReviewParent> = titles.iter().filter(|t| !done.contains(&t.id)).collect();
        stats.titles_resumed = (titles.len() - pending.len()) as u64;

        tracing::info!(
            titles = titles.len(),
            pending = pending.len(),
            resumed = stats.titles_resumed,
            "Starting review crawl"
        );

        bootstrap_session(self.sessions, self.source).await;

        let mut crawl = CrawlLoop::new(self.source, self.retry.clone(), self.page_delay)
            .with_session_provider(self.sessions)
            .with_records(existing);

        for (idx, parent) in pending.iter().enumerate() {
            tracing::info!(
                index = idx + 1,
                total = pending.len(),
                title_id = %parent.id,
                name = %parent.name,
                "Fetching reviews"
            );

            let before = crawl.records().len();
            let query = PagedQuery::reviews(&self.api, &parent.id);
            let now = Utc::now();

            match crawl
                .run(&query, |edge| extract_review(edge, parent, now), |_| {})
                .await
            {
                Ok(()) => {
                    let found = crawl.records().len() - before;
                    stats.titles += 1;
                    tracing::info!(title_id = %parent.id, reviews = found, "Reviews fetched");
                }
                Err(e) => {
                    crawl.truncate(before);
                    stats.titles_failed += 1;
                    tracing::warn!(title_id = %parent.id, error = %e, "Skipping title");
                }
            }

            save_checkpoint(checkpoint, crawl.records(), "review");
            tokio::time::sleep(self.item_delay).await;
        }

        let (records, crawl_stats) = crawl.into_parts();
        stats.crawl = crawl_stats;
        stats.reviews = records.len() as u64;

        tracing::info!(
            titles = stats.titles,
            failed = stats.titles_failed,
            reviews = stats.reviews,
            "Review crawl completed"
        );

        Ok(PhaseOutput { records, stats })
    }
}
