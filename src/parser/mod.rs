//! Extraction rules
//!
//! Pure functions that turn raw, semi-structured JSON from the API and the
//! title pages into normalized records. Nothing here performs I/O and nothing
//! panics on malformed input: every nested lookup is optional, and a record
//! whose identity cannot be recovered is rejected with a [`MalformedRecord`]
//! reason rather than emitted partially.
//!
//! [`MalformedRecord`]: crate::utils::error::MalformedRecord

pub mod catalog;
pub mod detail;
pub mod genres;
pub mod review;
pub mod sanitize;

pub use catalog::extract_catalog_record;
pub use detail::{extract_next_data, merge_detail, parse_title_sections, ScrapedTitle, TitleSections};
pub use genres::{GenreContainer, GenreEntry};
pub use review::{extract_review, ReviewParent};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode an optional field, treating a value of the wrong type as absent
///
/// A renamed or retyped upstream field then costs one value instead of the
/// whole record.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// `{ "text": "..." }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextValue {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

/// `{ "year": 2004 }`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct YearValue {
    #[serde(default, deserialize_with = "lenient")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RatingsSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub aggregate_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub vote_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Runtime {
    #[serde(default, deserialize_with = "lenient")]
    pub seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlotText {
    #[serde(default, deserialize_with = "lenient")]
    pub plain_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Plot {
    #[serde(default, deserialize_with = "lenient")]
    pub plot_text: Option<PlotText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Image {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

pub(crate) fn text_of(value: Option<&TextValue>) -> String {
    value.and_then(|t| t.text.clone()).unwrap_or_default()
}

pub(crate) fn plot_of(plot: Option<&Plot>) -> String {
    plot.and_then(|p| p.plot_text.as_ref())
        .and_then(|t| t.plain_text.clone())
        .unwrap_or_default()
}

pub(crate) fn image_of(image: Option<&Image>) -> String {
    image.and_then(|i| i.url.clone()).unwrap_or_default()
}

/// Whole minutes in a runtime, rounding down; absent or negative seconds give 0
///
/// # Examples
///
/// ```
/// use marquee::parser::runtime_minutes;
///
/// assert_eq!(runtime_minutes(Some(125)), 2);
/// assert_eq!(runtime_minutes(Some(59)), 0);
/// assert_eq!(runtime_minutes(None), 0);
/// ```
pub fn runtime_minutes(seconds: Option<i64>) -> u64 {
    match seconds {
        Some(s) if s > 0 => (s / 60) as u64,
        _ => 0,
    }
}
