//! Title page extraction and merge
//!
//! A rendered title page embeds its data as JSON in `script#__NEXT_DATA__`:
//!
//! ```json
//! { "props": { "pageProps": { "aboveTheFoldData": {...}, "mainColumnData": {...} } } }
//! ```
//!
//! Extraction runs in three steps so the caller can keep whatever was parsed
//! for diagnostics when a later step fails:
//! [`extract_next_data`] → [`parse_title_sections`] → [`ScrapedTitle::from_sections`],
//! then [`merge_detail`] lays the scrape over the catalog record.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use super::genres::GenreContainer;
use super::{
    image_of, lenient, plot_of, runtime_minutes, text_of, Image, Plot, RatingsSummary, Runtime,
    TextValue, YearValue,
};
use crate::models::{CatalogRecord, DetailRecord};
use crate::utils::error::{DetailError, MalformedRecord};

static NEXT_DATA_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#__NEXT_DATA__").unwrap());

/// Parse the embedded data blob out of page markup
///
/// Returns `Ok(None)` when the marker script is not in the markup yet.
pub fn extract_next_data(markup: &str) -> Result<Option<Value>, DetailError> {
    let document = Html::parse_document(markup);
    let Some(script) = document.select(&NEXT_DATA_SELECTOR).next() else {
        return Ok(None);
    };

    let raw: String = script.text().collect();
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Whether the marker script is present in the markup
pub fn has_next_data(markup: &str) -> bool {
    Html::parse_document(markup)
        .select(&NEXT_DATA_SELECTOR)
        .next()
        .is_some()
}

/// The two substructures a title page must carry
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSections {
    pub above_the_fold: Value,
    pub main_column: Value,
}

/// Pull `aboveTheFoldData` and `mainColumnData` from the embedded blob
///
/// A section that is absent, null, not an object or an empty object counts
/// as missing.
pub fn parse_title_sections(next_data: &Value) -> Result<TitleSections, DetailError> {
    let page_props = next_data
        .get("props")
        .and_then(|p| p.get("pageProps"))
        .filter(|p| p.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or(DetailError::MissingSection("pageProps"))?;

    let section = |key: &'static str| {
        page_props
            .get(key)
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .cloned()
            .ok_or(DetailError::MissingSection(key))
    };

    Ok(TitleSections {
        above_the_fold: section("aboveTheFoldData")?,
        main_column: section("mainColumnData")?,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAboveTheFold {
    #[serde(default, deserialize_with = "lenient")]
    title_text: Option<TextValue>,
    #[serde(default, deserialize_with = "lenient")]
    original_title_text: Option<TextValue>,
    #[serde(default, deserialize_with = "lenient")]
    release_year: Option<YearValue>,
    #[serde(default, deserialize_with = "lenient")]
    ratings_summary: Option<RatingsSummary>,
    #[serde(default, deserialize_with = "lenient")]
    reviews: Option<Total>,
    #[serde(default, deserialize_with = "lenient")]
    critic_reviews: Option<Total>,
    #[serde(default, deserialize_with = "lenient")]
    certificate: Option<Certificate>,
    #[serde(default, deserialize_with = "lenient")]
    meter_ranking: Option<MeterRanking>,
    #[serde(default, deserialize_with = "lenient")]
    runtime: Option<Runtime>,
    #[serde(default, deserialize_with = "lenient")]
    genres: Option<GenreContainer>,
    #[serde(default, deserialize_with = "lenient")]
    plot: Option<Plot>,
    #[serde(default, deserialize_with = "lenient")]
    primary_image: Option<Image>,
}

#[derive(Debug, Default, Deserialize)]
struct Total {
    #[serde(default, deserialize_with = "lenient")]
    total: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct Certificate {
    #[serde(default, deserialize_with = "lenient")]
    rating: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeterRanking {
    #[serde(default, deserialize_with = "lenient")]
    current_rank: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMainColumn {
    #[serde(default, deserialize_with = "lenient")]
    countries_of_origin: Option<Countries>,
}

#[derive(Debug, Default, Deserialize)]
struct Countries {
    #[serde(default, deserialize_with = "lenient")]
    countries: Option<Vec<Value>>,
}

/// Fields read from a title page, before merging
///
/// Empty strings, zero counts and empty lists mean "not on the page".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedTitle {
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
}

impl ScrapedTitle {
    /// Read the field map out of both sections
    pub fn from_sections(sections: &TitleSections) -> Result<Self, DetailError> {
        let above = RawAboveTheFold::deserialize(&sections.above_the_fold)
            .map_err(|e| DetailError::Incomplete(MalformedRecord::Shape(e.to_string())))?;
        let main = RawMainColumn::deserialize(&sections.main_column)
            .map_err(|e| DetailError::Incomplete(MalformedRecord::Shape(e.to_string())))?;

        let ratings = above.ratings_summary.unwrap_or_default();

        let countries = main
            .countries_of_origin
            .and_then(|c| c.countries)
            .unwrap_or_default()
            .iter()
            .filter_map(|c| c.get("text").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        Ok(Self {
            name: text_of(above.title_text.as_ref()),
            original_title: text_of(above.original_title_text.as_ref()),
            year: above.release_year.and_then(|y| y.year),
            rating: ratings.aggregate_rating,
            votes: ratings.vote_count.unwrap_or(0),
            user_reviews_count: above.reviews.and_then(|r| r.total).unwrap_or(0),
            critic_reviews_count: above.critic_reviews.and_then(|r| r.total).unwrap_or(0),
            countries,
            certificate: above.certificate.and_then(|c| c.rating).unwrap_or_default(),
            popularity_rank: above.meter_ranking.and_then(|m| m.current_rank),
            genres: above.genres.map(|g| g.names()).unwrap_or_default(),
            runtime_minutes: runtime_minutes(above.runtime.and_then(|r| r.seconds)),
            plot: plot_of(above.plot.as_ref()),
            primary_image: image_of(above.primary_image.as_ref()),
        })
    }
}

fn or_fallback(fresh: String, fallback: &str) -> String {
    if fresh.trim().is_empty() {
        fallback.to_string()
    } else {
        fresh
    }
}

/// Lay a fresh scrape over its catalog record
///
/// Rating, votes and name fall back to the catalog when the scraped value is
/// falsy (absent, zero or empty). Original title falls back to the merged
/// name. Genres, plot and image fall back to the catalog when the page does
/// not carry them. Every other field comes from the page only.
pub fn merge_detail(
    catalog: &CatalogRecord,
    scraped: ScrapedTitle,
    now: DateTime<Utc>,
) -> Result<DetailRecord, MalformedRecord> {
    if catalog.id.trim().is_empty() {
        return Err(MalformedRecord::MissingId);
    }

    let name = or_fallback(scraped.name, &catalog.title);
    if name.trim().is_empty() {
        return Err(MalformedRecord::MissingName);
    }
    let original_title = or_fallback(scraped.original_title, &name);

    let rating = scraped
        .rating
        .filter(|r| *r != 0.0)
        .or(catalog.rating);
    let votes = if scraped.votes == 0 {
        catalog.votes
    } else {
        scraped.votes
    };
    let genres = if scraped.genres.is_empty() {
        catalog.genres.clone()
    } else {
        scraped.genres
    };

    Ok(DetailRecord {
        id: catalog.id.clone(),
        name,
        original_title,
        year: scraped.year,
        rating,
        votes,
        user_reviews_count: scraped.user_reviews_count,
        critic_reviews_count: scraped.critic_reviews_count,
        countries: scraped.countries,
        certificate: scraped.certificate,
        popularity_rank: scraped.popularity_rank,
        genres,
        runtime_minutes: scraped.runtime_minutes,
        plot: or_fallback(scraped.plot, &catalog.plot),
        primary_image: or_fallback(scraped.primary_image, &catalog.primary_image),
        last_updated: now,
    })
}
