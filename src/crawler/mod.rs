//! Crawl engine
//!
//! Three sequential phases share one pagination loop:
//!
//! 1. [`catalog::CatalogCrawler`] pages through the title search
//! 2. [`detail::DetailEnricher`] enriches each title from its rendered page
//! 3. [`review::ReviewCrawler`] pages through each title's reviews
//!
//! Everything runs on a single task; rate limiting is a fixed sleep between
//! pages and between titles.

pub mod catalog;
pub mod detail;
pub mod fetcher;
pub mod headers;
pub mod pager;
pub mod query;
pub mod review;

pub use catalog::CatalogCrawler;
pub use detail::{DetailEnricher, DetailSource, HttpDetailSource};
pub use fetcher::{GraphQlFetcher, Page, PageInfo, PageSource};
pub use pager::{CrawlLoop, LoopState};
pub use query::PagedQuery;
pub use review::ReviewCrawler;

use crate::session::SessionProvider;
use crate::storage::Checkpoint;

/// Install a first session before a phase starts
///
/// A failed bootstrap is logged and the phase carries on without cookies;
/// a later challenge page triggers another attempt.
pub(crate) async fn bootstrap_session(sessions: &dyn SessionProvider, source: &dyn PageSource) {
    match sessions.bootstrap().await {
        Ok(session) => {
            tracing::info!(cookies = session.len(), "Session installed");
            source.install_session(session).await;
        }
        Err(e) => tracing::warn!(error = %e, "Initial session bootstrap failed, continuing without cookies"),
    }
}

/// Save a checkpoint, logging instead of failing
pub(crate) fn save_checkpoint<T>(checkpoint: &mut dyn Checkpoint<T>, records: &[T], phase: &str) {
    if let Err(e) = checkpoint.save(records) {
        tracing::error!(phase, records = records.len(), error = %e, "Failed to save checkpoint");
    }
}
