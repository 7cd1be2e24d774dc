// Core data structures for marquee crawler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One catalog entry produced from a search result edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CatalogRecord {
    pub id: String, // External title id (e.g., "tt0123456")
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub votes: u64,
    pub runtime_minutes: u64,
    pub genres: Vec<String>,
    pub plot: String,
    pub primary_image: String, // Cover image URL, empty when absent
}

/// Catalog entry enriched with fields scraped from the title page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub id: String,
    pub name: String,
    pub original_title: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub votes: u64,
    pub user_reviews_count: u64,
    pub critic_reviews_count: u64,
    pub countries: Vec<String>,
    pub certificate: String,
    pub popularity_rank: Option<u64>,
    pub genres: Vec<String>,
    pub runtime_minutes: u64,
    pub plot: String,
    pub primary_image: String,
    pub last_updated: DateTime<Utc>,
}

/// One user review attached to a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: String,
    pub movie_id: String,
    pub movie_name: String,
    pub original_title: String,
    pub review_title: String,
    pub review_content: String,
    pub spoiler: bool,
    pub rating: Option<u32>,
    pub like: u64,
    pub dislike: u64,
    pub reviewer_username: String,
    pub submission_date: String,
    pub updated_at: DateTime<Utc>,
}

/// Anything that can be keyed by the catalog id it belongs to.
///
/// Used by the resumable phases to work out which titles a previous
/// checkpoint already covers.
pub trait TitleKeyed {
    fn title_id(&self) -> &str;
}

impl TitleKeyed for CatalogRecord {
    fn title_id(&self) -> &str {
        &self.id
    }
}

impl TitleKeyed for DetailRecord {
    fn title_id(&self) -> &str {
        &self.id
    }
}

impl TitleKeyed for ReviewRecord {
    fn title_id(&self) -> &str {
        &self.movie_id
    }
}

/// Records produced by one phase, with its counters
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutput<T, S> {
    pub records: Vec<T>,
    pub stats: S,
}

/// Counters for one paginated crawl (one catalog run, or one title's reviews)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Requests issued to the page source, successful or not
    pub fetch_calls: u64,

    /// Pages that decoded successfully
    pub pages: u64,

    /// Failed fetch attempts
    pub fetch_failures: u64,

    /// Session renewals triggered by challenge pages
    pub session_renewals: u64,

    /// Edges seen across all pages
    pub edges: u64,

    /// Records that passed extraction
    pub records: u64,

    /// Edges dropped by extraction
    pub malformed: u64,
}

impl CrawlStats {
    /// Fold another run's counters into this one
    pub fn absorb(&mut self, other: &CrawlStats) {
        self.fetch_calls += other.fetch_calls;
        self.pages += other.pages;
        self.fetch_failures += other.fetch_failures;
        self.session_renewals += other.session_renewals;
        self.edges += other.edges;
        self.records += other.records;
        self.malformed += other.malformed;
    }
}

/// Counters for the detail enrichment phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailStats {
    pub processed: u64,
    pub enriched: u64,
    pub skipped: u64,
    pub failed: u64,
    pub resumed: u64,
    pub checkpoints: u64,
}

/// Counters for the review phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub titles: u64,
    pub titles_failed: u64,
    pub titles_resumed: u64,
    pub reviews: u64,
    pub crawl: CrawlStats,
}
