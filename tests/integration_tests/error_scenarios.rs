//! Error scenario integration tests
//!
//! Failed fetches, challenge pages and retry ceilings against a mock server.

use marquee::prelude::*;
use marquee::utils::error::{CrawlerError, FetchError};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::CHALLENGE_PAGE;
use crate::common::{
    catalog_edge, catalog_page, review_edge, review_page, test_config, CursorIs, TitleIs,
};

fn homepage_session(config: &Config) -> HomepageSession {
    HomepageSession::new(
        &config.api.site_url,
        &config.api.user_agent,
        Duration::from_secs(2),
    )
    .unwrap()
}

// ============================================================================
// Retry on the same cursor
// ============================================================================

/// Test a server error is retried on the same cursor without skipping a page
#[tokio::test]
async fn test_server_error_retries_same_cursor() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(CursorIs(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(
            vec![catalog_edge("tt1", "Tấm Cám"), catalog_edge("tt2", "Song Lang")],
            true,
            Some("c2"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Second page fails once, then succeeds
    Mock::given(method("GET"))
        .and(CursorIs(Some("c2")))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(CursorIs(Some("c2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(
            vec![catalog_edge("tt3", "Lật mặt")],
            false,
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::default();
    let mut checkpoint = MemoryCheckpoint::<CatalogRecord>::new();

    let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut checkpoint)
        .await
        .unwrap();

    let ids: Vec<&str> = catalog.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["tt1", "tt2", "tt3"]);
    assert_eq!(catalog.stats.fetch_calls, 3);
    assert_eq!(catalog.stats.fetch_failures, 1);
    assert_eq!(checkpoint.sizes(), vec![2, 3]);
}

// ============================================================================
// Session renewal
// ============================================================================

/// Test a challenge page triggers a new homepage session before the retry
#[tokio::test]
async fn test_challenge_renews_session() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.api.site_url = format!("{}/home/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/home/"))
        .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "session-id=old; Path=/"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/home/"))
        .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "session-id=new; Path=/"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "session-id=old"))
        .respond_with(ResponseTemplate::new(403).set_body_string(CHALLENGE_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "session-id=new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(
            vec![catalog_edge("tt1", "Tấm Cám")],
            false,
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = homepage_session(&config);
    let mut checkpoint = MemoryCheckpoint::<CatalogRecord>::new();

    let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut checkpoint)
        .await
        .unwrap();

    assert_eq!(catalog.records.len(), 1);
    assert_eq!(catalog.stats.session_renewals, 1);
    assert_eq!(catalog.stats.fetch_failures, 1);
    assert_eq!(fetcher.session().await.get("session-id"), Some("new"));
}

/// Test a failed initial bootstrap does not stop the phase
#[tokio::test]
async fn test_failed_bootstrap_continues_without_cookies() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.api.site_url = format!("{}/home/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/home/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(
            vec![catalog_edge("tt1", "Tấm Cám")],
            false,
            None,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = homepage_session(&config);
    let mut checkpoint = MemoryCheckpoint::<CatalogRecord>::new();

    let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut checkpoint)
        .await
        .unwrap();

    assert_eq!(catalog.records.len(), 1);
    assert!(fetcher.session().await.is_empty());
}

// ============================================================================
// Retry ceiling
// ============================================================================

/// Test exhausting retries ends the catalog phase with the pages so far saved
#[tokio::test]
async fn test_catalog_gives_up_after_max_retries() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.crawl.max_retries = Some(2);

    Mock::given(method("GET"))
        .and(CursorIs(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog_page(
            vec![catalog_edge("tt1", "Tấm Cám")],
            true,
            Some("c2"),
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(CursorIs(Some("c2")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3) // First attempt plus two retries
        .mount(&mock_server)
        .await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::default();
    let mut file = JsonCheckpoint::new(&config.output.catalog_path);

    let result = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut file)
        .await;

    match result {
        Err(CrawlerError::RetriesExhausted {
            attempts,
            cursor,
            last,
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(cursor.as_deref(), Some("c2"));
            assert!(matches!(last, FetchError::Status(500)));
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }

    let saved: Vec<CatalogRecord> = Checkpoint::<CatalogRecord>::load(&file).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, "tt1");
}

/// Test a rejected persisted query ends the phase without retrying
#[tokio::test]
async fn test_rejected_query_is_not_retried() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.crawl.max_retries = None;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"errors": [{"message": "PersistedQueryNotFound"}]}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::default();
    let mut checkpoint = MemoryCheckpoint::<CatalogRecord>::new();

    let result = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut checkpoint)
        .await;

    match result {
        Err(err @ CrawlerError::Fetch(FetchError::Rejected(_))) => {
            assert!(!err.is_recoverable());
            assert!(err.to_string().contains("PersistedQueryNotFound"));
        }
        other => panic!("Expected a rejected query, got {other:?}"),
    }
    assert!(checkpoint.sizes().is_empty());
}

/// Test a title whose reviews keep failing is skipped, not fatal
#[tokio::test]
async fn test_review_phase_skips_exhausted_title() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.crawl.max_retries = Some(1);

    Mock::given(method("GET"))
        .and(query_param("operationName", "TitleReviewsRefine"))
        .and(TitleIs("tt1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("operationName", "TitleReviewsRefine"))
        .and(TitleIs("tt2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_page(
                vec![review_edge("rw1"), review_edge("rw2")],
                false,
                None,
            )),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let titles = vec![
        ReviewParent {
            id: "tt1".to_string(),
            name: "Tấm Cám".to_string(),
            original_title: "Tam Cam: The Untold Story".to_string(),
        },
        ReviewParent {
            id: "tt2".to_string(),
            name: "Song Lang".to_string(),
            original_title: "Song Lang".to_string(),
        },
    ];

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::default();
    let mut checkpoint = MemoryCheckpoint::<ReviewRecord>::new();

    let reviews = ReviewCrawler::new(&fetcher, &sessions, &config)
        .run(&titles, &mut checkpoint)
        .await
        .unwrap();

    assert_eq!(reviews.stats.titles, 1);
    assert_eq!(reviews.stats.titles_failed, 1);
    assert!(reviews.records.iter().all(|r| r.movie_id == "tt2"));
    assert_eq!(reviews.records.len(), 2);

    // Saved after each title, including the failed one
    assert_eq!(checkpoint.sizes(), vec![0, 2]);
}
