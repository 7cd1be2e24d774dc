//! Review edge extraction

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::lenient;
use super::sanitize::{clean_review_text, decode_entities};
use crate::models::{DetailRecord, ReviewRecord};
use crate::utils::error::MalformedRecord;

/// Title a batch of reviews belongs to, copied onto every review
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewParent {
    pub id: String,
    pub name: String,
    pub original_title: String,
}

impl From<&DetailRecord> for ReviewParent {
    fn from(record: &DetailRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            original_title: record.original_title.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    #[serde(default, deserialize_with = "lenient")]
    node: Option<RawReview>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    summary: Option<OriginalText>,
    #[serde(default, deserialize_with = "lenient")]
    text: Option<RawBody>,
    #[serde(default, deserialize_with = "lenient")]
    spoiler: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    author_rating: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    helpfulness: Option<Helpfulness>,
    #[serde(default, deserialize_with = "lenient")]
    author: Option<Author>,
    #[serde(default, deserialize_with = "lenient")]
    submission_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OriginalText {
    #[serde(default, deserialize_with = "lenient")]
    original_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBody {
    #[serde(default, deserialize_with = "lenient")]
    original_text: Option<PlaidHtml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaidHtml {
    #[serde(default, deserialize_with = "lenient")]
    plaid_html: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Helpfulness {
    #[serde(default, deserialize_with = "lenient")]
    up_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    down_votes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    #[serde(default, deserialize_with = "lenient")]
    nick_name: Option<String>,
}

/// Extract one review from a `title.reviews` edge
///
/// The body is entity-decoded with `<br>` tags turned into newlines; the
/// summary is entity-decoded only. An edge without a node or review id is
/// rejected.
pub fn extract_review(
    edge: &Value,
    parent: &ReviewParent,
    now: DateTime<Utc>,
) -> Result<ReviewRecord, MalformedRecord> {
    let edge = RawEdge::deserialize(edge).map_err(|e| MalformedRecord::Shape(e.to_string()))?;
    let node = edge.node.ok_or(MalformedRecord::MissingNode)?;

    let review_id = node
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or(MalformedRecord::MissingId)?;

    let title = node
        .summary
        .and_then(|s| s.original_text)
        .unwrap_or_default();
    let body = node
        .text
        .and_then(|t| t.original_text)
        .and_then(|t| t.plaid_html)
        .unwrap_or_default();
    let helpfulness = node.helpfulness.unwrap_or_default();

    Ok(ReviewRecord {
        review_id,
        movie_id: parent.id.clone(),
        movie_name: parent.name.clone(),
        original_title: parent.original_title.clone(),
        review_title: decode_entities(&title),
        review_content: clean_review_text(&body),
        spoiler: node.spoiler.unwrap_or(false),
        rating: node.author_rating,
        like: helpfulness.up_votes.unwrap_or(0),
        dislike: helpfulness.down_votes.unwrap_or(0),
        reviewer_username: node.author.and_then(|a| a.nick_name).unwrap_or_default(),
        submission_date: node.submission_date.unwrap_or_default(),
        updated_at: now,
    })
}
