//! Common test utilities

use marquee::config::Config;
use serde_json::{json, Value};
use std::path::Path;
use wiremock::{Match, Request};

/// Configuration pointed at a mock server, with every delay at zero
pub fn test_config(server_uri: &str, output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{server_uri}/");
    config.api.site_url = format!("{server_uri}/");
    config.api.request_timeout_secs = 2;
    config.crawl.page_delay_ms = 0;
    config.crawl.retry_backoff_ms = 0;
    config.crawl.max_retries = Some(3);
    config.detail.title_url_base = format!("{server_uri}/title/");
    config.detail.marker_timeout_secs = 1;
    config.detail.marker_poll_ms = 50;
    config.detail.item_delay_ms = 0;
    config.review.item_delay_ms = Some(0);
    config.output.catalog_path = output_dir.join("catalog.json");
    config.output.detail_path = output_dir.join("details.json");
    config.output.review_path = output_dir.join("reviews.json");
    config.output.diagnostics_dir = output_dir.join("error_logs");
    config
}

/// One catalog search edge
pub fn catalog_edge(id: &str, title: &str) -> Value {
    json!({
        "node": {
            "title": {
                "id": id,
                "titleText": {"text": title},
                "releaseYear": {"year": 2019},
                "ratingsSummary": {"aggregateRating": 6.8, "voteCount": 250},
                "runtime": {"seconds": 5940},
                "titleGenres": {"genres": [{"genre": {"text": "Action"}}]},
                "plot": {"plotText": {"plainText": format!("Plot of {title}")}},
                "primaryImage": {"url": format!("https://img.example/{id}.jpg")}
            }
        }
    })
}

/// Catalog response envelope
pub fn catalog_page(edges: Vec<Value>, has_next: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "advancedTitleSearch": {
                "edges": edges,
                "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor}
            }
        }
    })
}

/// One review edge
#[allow(dead_code)]
pub fn review_edge(id: &str) -> Value {
    json!({
        "node": {
            "id": id,
            "summary": {"originalText": "Hay &amp; c&#7843;m &#273;&#7897;ng"},
            "text": {"originalText": {"plaidHtml": "D&#242;ng 1<br/>D&#242;ng 2"}},
            "spoiler": false,
            "authorRating": 8,
            "helpfulness": {"upVotes": 5, "downVotes": 1},
            "author": {"nickName": "reviewer"},
            "submissionDate": "2020-02-14"
        }
    })
}

/// Review response envelope
#[allow(dead_code)]
pub fn review_page(edges: Vec<Value>, has_next: bool, end_cursor: Option<&str>) -> Value {
    json!({
        "data": {
            "title": {
                "reviews": {
                    "edges": edges,
                    "pageInfo": {"hasNextPage": has_next, "endCursor": end_cursor}
                }
            }
        }
    })
}

/// Rendered title page embedding the given above-the-fold data
#[allow(dead_code)]
pub fn title_page(above_the_fold: Value) -> String {
    let data = json!({
        "props": {
            "pageProps": {
                "aboveTheFoldData": above_the_fold,
                "mainColumnData": {
                    "countriesOfOrigin": {"countries": [{"id": "VN", "text": "Vietnam"}]}
                }
            }
        }
    });
    format!(
        r#"<!DOCTYPE html><html><head><title>Title</title></head><body><div id="root"></div><script id="__NEXT_DATA__" type="application/json">{data}</script></body></html>"#
    )
}

fn query_json(request: &Request, key: &str) -> Option<Value> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| serde_json::from_str(&v).ok())
}

/// Matches requests whose `variables.after` cursor equals the given one
///
/// `None` matches a first-page request: no `after`, or `after: ""`.
pub struct CursorIs(pub Option<&'static str>);

impl Match for CursorIs {
    fn matches(&self, request: &Request) -> bool {
        let Some(variables) = query_json(request, "variables") else {
            return false;
        };
        let after = variables
            .get("after")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty());
        after == self.0
    }
}

/// Matches review requests for one title id
#[allow(dead_code)]
pub struct TitleIs(pub &'static str);

impl Match for TitleIs {
    fn matches(&self, request: &Request) -> bool {
        query_json(request, "variables")
            .and_then(|v| v.get("const").and_then(Value::as_str).map(str::to_string))
            .is_some_and(|id| id == self.0)
    }
}
