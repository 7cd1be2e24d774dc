//! Catalog edge extraction
//!
//! Maps one `advancedTitleSearch` edge to a [`CatalogRecord`].

use serde::Deserialize;
use serde_json::Value;

use super::genres::{first_names, GenreContainer};
use super::{
    image_of, lenient, plot_of, runtime_minutes, text_of, Image, Plot, RatingsSummary, Runtime,
    TextValue, YearValue,
};
use crate::models::CatalogRecord;
use crate::utils::error::MalformedRecord;

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default, deserialize_with = "lenient")]
    node: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default, deserialize_with = "lenient")]
    title: Option<RawTitle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTitle {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    title_text: Option<TextValue>,
    #[serde(default, deserialize_with = "lenient")]
    release_year: Option<YearValue>,
    #[serde(default, deserialize_with = "lenient")]
    ratings_summary: Option<RatingsSummary>,
    #[serde(default, deserialize_with = "lenient")]
    runtime: Option<Runtime>,
    #[serde(default, deserialize_with = "lenient")]
    title_genres: Option<GenreContainer>,
    #[serde(default, deserialize_with = "lenient")]
    genres: Option<GenreContainer>,
    #[serde(default, deserialize_with = "lenient")]
    plot: Option<Plot>,
    #[serde(default, deserialize_with = "lenient")]
    primary_image: Option<Image>,
}

/// Extract a catalog record from one search result edge
///
/// Rejects the edge when the node, id or title text cannot be recovered.
/// Rating defaults to `None` and votes to 0 when the ratings summary is
/// absent; runtime is whole minutes, rounding down.
///
/// # Example
/// ```
/// use marquee::parser::extract_catalog_record;
/// use serde_json::json;
///
/// let edge = json!({"node": {"title": {
///     "id": "tt0000001",
///     "titleText": {"text": "Mùa len trâu"},
///     "runtime": {"seconds": 6900}
/// }}});
///
/// let record = extract_catalog_record(&edge).unwrap();
/// assert_eq!(record.runtime_minutes, 115);
/// assert_eq!(record.votes, 0);
/// ```
pub fn extract_catalog_record(edge: &Value) -> Result<CatalogRecord, MalformedRecord> {
    let edge = RawEdge::deserialize(edge).map_err(|e| MalformedRecord::Shape(e.to_string()))?;
    let node = edge.node.ok_or(MalformedRecord::MissingNode)?;
    let title = node.title.ok_or(MalformedRecord::MissingTitle)?;

    let id = title
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(MalformedRecord::MissingId)?
        .to_string();

    let name = text_of(title.title_text.as_ref());
    if name.trim().is_empty() {
        return Err(MalformedRecord::MissingName);
    }

    let ratings = title.ratings_summary.unwrap_or_default();

    Ok(CatalogRecord {
        id,
        title: name,
        year: title.release_year.and_then(|y| y.year),
        rating: ratings.aggregate_rating,
        votes: ratings.vote_count.unwrap_or(0),
        runtime_minutes: runtime_minutes(title.runtime.and_then(|r| r.seconds)),
        genres: first_names([title.title_genres.as_ref(), title.genres.as_ref()]),
        plot: plot_of(title.plot.as_ref()),
        primary_image: image_of(title.primary_image.as_ref()),
    })
}
