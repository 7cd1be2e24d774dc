//! Pipeline integration tests
//!
//! Runs the catalog, detail and review phases against a mock server and
//! checks what lands in the checkpoint files.

use marquee::prelude::*;
use marquee::storage::DiagnosticsWriter;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{
    full_above_the_fold, sparse_above_the_fold, PAGE_WITHOUT_MAIN_COLUMN, PAGE_WITH_BROKEN_DATA,
};
use crate::common::{
    catalog_edge, catalog_page, review_edge, review_page, test_config, title_page, CursorIs,
    TitleIs,
};

// ============================================================================
// Mock setup
// ============================================================================

/// Three catalog pages holding tt1..tt5
async fn mount_catalog(server: &MockServer) {
    let pages = [
        (None, vec![("tt1", "Hai Phượng"), ("tt2", "Cô Ba Sài Gòn")], Some("c2")),
        (Some("c2"), vec![("tt3", "Bố già"), ("tt4", "Mắt biếc")], Some("c3")),
        (Some("c3"), vec![("tt5", "Ròm")], None),
    ];

    for (cursor, titles, next) in pages {
        let edges = titles
            .iter()
            .map(|(id, name)| catalog_edge(id, name))
            .collect();
        Mock::given(method("GET"))
            .and(query_param("operationName", "AdvancedTitleSearch"))
            .and(CursorIs(cursor))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(catalog_page(edges, next.is_some(), next)),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

async fn mount_title_page(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/title/{id}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_reviews(
    server: &MockServer,
    id: &'static str,
    cursor: Option<&'static str>,
    review_ids: &[&str],
    next: Option<&str>,
) {
    let edges = review_ids.iter().map(|r| review_edge(r)).collect();
    Mock::given(method("GET"))
        .and(query_param("operationName", "TitleReviewsRefine"))
        .and(TitleIs(id))
        .and(CursorIs(cursor))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_page(edges, next.is_some(), next)),
        )
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Catalog phase
// ============================================================================

/// Test a three-page catalog crawl issues exactly three fetches
#[tokio::test]
async fn test_catalog_crawl_three_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path());
    mount_catalog(&mock_server).await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::new(Session::parse("session-id=test"));
    let mut file = JsonCheckpoint::new(&config.output.catalog_path);

    let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut file)
        .await
        .unwrap();

    let ids: Vec<&str> = catalog.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["tt1", "tt2", "tt3", "tt4", "tt5"]);
    assert_eq!(catalog.stats.fetch_calls, 3);
    assert_eq!(catalog.stats.pages, 3);
    assert_eq!(catalog.stats.fetch_failures, 0);

    let first = &catalog.records[0];
    assert_eq!(first.title, "Hai Phượng");
    assert_eq!(first.runtime_minutes, 99);
    assert_eq!(first.genres, vec!["Action"]);

    let saved: Vec<CatalogRecord> = Checkpoint::<CatalogRecord>::load(&file).unwrap();
    assert_eq!(saved, catalog.records);
}

/// Test the checkpoint file keeps non-ASCII text literal
#[tokio::test]
async fn test_catalog_file_is_readable_utf8() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path());
    mount_catalog(&mock_server).await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::default();
    let mut file = JsonCheckpoint::new(&config.output.catalog_path);

    CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut file)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&config.output.catalog_path).unwrap();
    assert!(content.contains("Cô Ba Sài Gòn"));
    assert!(content.contains("\n    {"));
    assert!(!dir.path().join("catalog.json.tmp").exists());
}

// ============================================================================
// Full pipeline
// ============================================================================

/// Test catalog → detail → reviews with checkpoint files and diagnostics
#[tokio::test]
async fn test_full_pipeline() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path());

    mount_catalog(&mock_server).await;
    mount_title_page(&mock_server, "tt1", title_page(full_above_the_fold())).await;
    mount_title_page(&mock_server, "tt2", title_page(sparse_above_the_fold())).await;
    mount_title_page(&mock_server, "tt3", PAGE_WITHOUT_MAIN_COLUMN.to_string()).await;
    mount_title_page(&mock_server, "tt4", PAGE_WITH_BROKEN_DATA.to_string()).await;
    mount_title_page(&mock_server, "tt5", title_page(full_above_the_fold())).await;

    mount_reviews(&mock_server, "tt1", None, &["rw1", "rw2"], Some("r2")).await;
    mount_reviews(&mock_server, "tt1", Some("r2"), &["rw3"], None).await;
    mount_reviews(&mock_server, "tt2", None, &[], None).await;
    mount_reviews(&mock_server, "tt5", None, &["rw4"], None).await;

    let fetcher = GraphQlFetcher::new(&config.api).unwrap();
    let sessions = StaticSession::new(Session::parse("session-id=test"));

    // Phase 1
    let mut catalog_file = JsonCheckpoint::new(&config.output.catalog_path);
    let catalog = CatalogCrawler::new(&fetcher, &sessions, &config)
        .run(&mut catalog_file)
        .await
        .unwrap();
    assert_eq!(catalog.records.len(), 5);

    // Phase 2
    let source = HttpDetailSource::new(&config.api, &config.detail).unwrap();
    let mut detail_file = JsonCheckpoint::new(&config.output.detail_path);
    let details = DetailEnricher::new(source, &config)
        .run(&catalog.records, &mut detail_file)
        .await
        .unwrap();

    let ids: Vec<&str> = details.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["tt1", "tt2", "tt5"]);
    assert_eq!(details.stats.processed, 5);
    assert_eq!(details.stats.enriched, 3);
    assert_eq!(details.stats.failed, 2);
    assert_eq!(details.stats.checkpoints, 2);

    let furie = &details.records[0];
    assert_eq!(furie.name, "Hai Phượng");
    assert_eq!(furie.original_title, "Furie");
    assert_eq!(furie.votes, 5400);
    assert_eq!(furie.certificate, "C18");
    assert_eq!(furie.countries, vec!["Vietnam"]);
    assert_eq!(furie.genres, vec!["Action", "Crime", "Drama"]);
    assert_eq!(furie.runtime_minutes, 98);

    // Sparse page falls back to the catalog where the page is falsy
    let sparse = &details.records[1];
    assert_eq!(sparse.name, "Cô Ba Sài Gòn");
    assert_eq!(sparse.original_title, "Cô Ba Sài Gòn");
    assert_eq!(sparse.rating, Some(6.8));
    assert_eq!(sparse.votes, 250);
    assert_eq!(sparse.year, Some(2017));
    assert_eq!(sparse.genres, vec!["Action"]);
    assert_eq!(sparse.runtime_minutes, 0);

    // Only the unparseable page leaves a diagnostic behind
    let diagnostics = DiagnosticsWriter::new(&config.output.diagnostics_dir);
    assert!(diagnostics.path_for("tt4").exists());
    assert!(!diagnostics.path_for("tt3").exists());

    let saved: Vec<DetailRecord> = Checkpoint::<DetailRecord>::load(&detail_file).unwrap();
    assert_eq!(saved, details.records);

    // Phase 3
    let titles: Vec<ReviewParent> = details.records.iter().map(ReviewParent::from).collect();
    let mut review_file = JsonCheckpoint::new(&config.output.review_path);
    let reviews = ReviewCrawler::new(&fetcher, &sessions, &config)
        .run(&titles, &mut review_file)
        .await
        .unwrap();

    let review_ids: Vec<&str> = reviews.records.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(review_ids, vec!["rw1", "rw2", "rw3", "rw4"]);
    assert_eq!(reviews.stats.titles, 3);
    assert_eq!(reviews.stats.titles_failed, 0);
    assert_eq!(reviews.stats.crawl.fetch_calls, 4);

    let first = &reviews.records[0];
    assert_eq!(first.movie_id, "tt1");
    assert_eq!(first.movie_name, "Hai Phượng");
    assert_eq!(first.original_title, "Furie");
    assert_eq!(first.review_title, "Hay & cảm động");
    assert_eq!(first.review_content, "Dòng 1\nDòng 2");
    assert_eq!(first.rating, Some(8));
    assert_eq!((first.like, first.dislike), (5, 1));

    let saved: Vec<ReviewRecord> = Checkpoint::<ReviewRecord>::load(&review_file).unwrap();
    assert_eq!(saved, reviews.records);
}

/// Test a resumed detail run only loads titles missing from the checkpoint
#[tokio::test]
async fn test_detail_resume_skips_saved_titles() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&mock_server.uri(), dir.path());
    config.detail.resume = true;

    mount_title_page(&mock_server, "tt2", title_page(sparse_above_the_fold())).await;
    Mock::given(method("GET"))
        .and(path("/title/tt1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(title_page(full_above_the_fold())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let catalog = vec![
        CatalogRecord {
            id: "tt1".to_string(),
            title: "Hai Phượng".to_string(),
            ..Default::default()
        },
        CatalogRecord {
            id: "tt2".to_string(),
            title: "Cô Ba Sài Gòn".to_string(),
            ..Default::default()
        },
    ];

    // First run covers tt1 only
    let mut detail_file = JsonCheckpoint::new(&config.output.detail_path);
    let source = HttpDetailSource::new(&config.api, &config.detail).unwrap();
    DetailEnricher::new(source, &config)
        .run(&catalog[..1], &mut detail_file)
        .await
        .unwrap();

    // Second run over the whole catalog
    let source = HttpDetailSource::new(&config.api, &config.detail).unwrap();
    let details = DetailEnricher::new(source, &config)
        .run(&catalog, &mut detail_file)
        .await
        .unwrap();

    assert_eq!(details.stats.resumed, 1);
    assert_eq!(details.stats.processed, 1);
    let ids: Vec<&str> = details.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["tt1", "tt2"]);
}
