//! marquee - title catalog, detail and review harvester
//!
//! A sequential crawl engine for a cursor-paginated GraphQL API guarded by a
//! browser-derived session, with incremental JSON checkpoints.
//!
//! # Architecture
//!
//! - [`config`] - Configuration from defaults, environment and TOML
//! - [`session`] - Session cookies and the [`session::SessionProvider`] seam
//! - [`crawler`] - Request construction, fetching, the pagination loop and the three phases
//! - [`parser`] - Extraction rules from raw JSON to records
//! - [`storage`] - Atomic checkpoint files and diagnostic snapshots
//! - [`models`] - Record types and phase statistics
//! - [`utils`] - Domain errors, retry policy and helpers
//!
//! # Example
//!
//! ```no_run
//! use marquee::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     marquee::logging::init(&config.logging)?;
//!
//!     let fetcher = GraphQlFetcher::new(&config.api)?;
//!     let sessions = HomepageSession::new(
//!         &config.api.site_url,
//!         &config.api.user_agent,
//!         config.request_timeout(),
//!     )?;
//!
//!     let mut catalog_file = JsonCheckpoint::new(&config.output.catalog_path);
//!     let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
//!         .run(&mut catalog_file)
//!         .await?;
//!
//!     let source = HttpDetailSource::new(&config.api, &config.detail)?;
//!     let mut detail_file = JsonCheckpoint::new(&config.output.detail_path);
//!     let details = DetailEnricher::new(source, &config)
//!         .run(&catalog.records, &mut detail_file)
//!         .await?;
//!
//!     let titles: Vec<ReviewParent> = details.records.iter().map(ReviewParent::from).collect();
//!     let mut review_file = JsonCheckpoint::new(&config.output.review_path);
//!     ReviewCrawler::new(&fetcher, &sessions, &config)
//!         .run(&titles, &mut review_file)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod session;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{
        CatalogCrawler, CrawlLoop, DetailEnricher, DetailSource, GraphQlFetcher, HttpDetailSource,
        PageSource, PagedQuery, ReviewCrawler,
    };
    pub use crate::error::{Error, ErrorCategory, MarqueeErrorTrait, Result};
    pub use crate::models::{
        CatalogRecord, CrawlStats, DetailRecord, DetailStats, PhaseOutput, ReviewRecord,
        ReviewStats,
    };
    pub use crate::parser::ReviewParent;
    pub use crate::session::{HomepageSession, Session, SessionProvider, StaticSession};
    pub use crate::storage::{Checkpoint, JsonCheckpoint, MemoryCheckpoint};
}

// Direct re-exports for convenience
pub use models::{CatalogRecord, CrawlStats, DetailRecord, ReviewRecord};
