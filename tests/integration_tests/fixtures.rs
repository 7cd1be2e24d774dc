//! Test fixtures for integration tests
//!
//! Provides sample title pages and API payloads for the mock server

use serde_json::{json, Value};

/// Above-the-fold data for a fully populated title page
pub fn full_above_the_fold() -> Value {
    json!({
        "titleText": {"text": "Hai Phượng"},
        "originalTitleText": {"text": "Furie"},
        "releaseYear": {"year": 2019},
        "ratingsSummary": {"aggregateRating": 6.9, "voteCount": 5400},
        "reviews": {"total": 62},
        "criticReviews": {"total": 41},
        "certificate": {"rating": "C18"},
        "meterRanking": {"currentRank": 1834},
        "runtime": {"seconds": 5880},
        "genres": {"genres": [{"text": "Action"}, {"text": "Crime"}, {"text": "Drama"}]},
        "plot": {"plotText": {"plainText": "Một người mẹ truy đuổi băng đảng bắt cóc con gái."}},
        "primaryImage": {"url": "https://img.example/furie.jpg"}
    })
}

/// Above-the-fold data where the page omits ratings and genres
pub fn sparse_above_the_fold() -> Value {
    json!({
        "titleText": {"text": "Cô Ba Sài Gòn"},
        "releaseYear": {"year": 2017},
        "ratingsSummary": {"aggregateRating": null, "voteCount": 0}
    })
}

/// Embedded data without the main column section
pub const PAGE_WITHOUT_MAIN_COLUMN: &str = r#"<!DOCTYPE html>
<html lang="vi">
<head><meta charset="UTF-8"><title>Bố già</title></head>
<body>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"aboveTheFoldData":{"titleText":{"text":"Bố già"}},"mainColumnData":{}}}}</script>
</body>
</html>"#;

/// Embedded data that is not valid JSON
pub const PAGE_WITH_BROKEN_DATA: &str = r#"<!DOCTYPE html>
<html lang="vi">
<head><meta charset="UTF-8"><title>Mắt biếc</title></head>
<body>
<script id="__NEXT_DATA__" type="application/json">{"props": {"pageProps": </script>
</body>
</html>"#;

/// Challenge page returned when the session is no longer accepted
pub const CHALLENGE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Verification</title></head>
<body><div id="challenge-container"><noscript>JavaScript is required</noscript></div></body>
</html>"#;
