//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: listing pages, load-more pagination,
//! detail extraction, dedup and the run ledger.

use estate_sweep::config::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, SourceEntry, StallPolicy,
    UserAgentConfig,
};
use estate_sweep::crawler::{crawl, ShutdownCoordinator, StopReason};
use estate_sweep::storage::{AdStore, RunLedger, RunStatus, SqliteAdStore};
use estate_sweep::{ConfigError, SweepError};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with one source on the mock server
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            worker_count: 2,
            max_ad_count: None,
            frame_budget: 5,
            fetch_timeout_ms: 5000,
            run_timeout_secs: Some(30),
            queue_capacity: 1,
            stall_policy: StallPolicy::Continue,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            summary_path: None,
        },
        sources: vec![SourceEntry {
            name: "mock-homes".to_string(),
            category: "apartment".to_string(),
            seeds: vec![format!("{}/list", base_url)],
            selectors: SelectorConfig {
                ad_link: "a.ad-card".to_string(),
                load_more: Some("a.next".to_string()),
                page_param: None,
                category: Some(".breadcrumb".to_string()),
                title: "h1".to_string(),
                price: Some(".price".to_string()),
                area: Some(".area".to_string()),
                rooms: Some(".rooms".to_string()),
                location: Some(".location".to_string()),
                amenities: Some(".amenities li".to_string()),
                contact: None,
                reference: Some(".reference".to_string()),
            },
        }],
    }
}

fn listing_page(ads: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><ul>");
    for ad in ads {
        html.push_str(&format!(r#"<li><a class="ad-card" href="{}">Ad</a></li>"#, ad));
    }
    html.push_str("</ul>");
    if let Some(next) = next {
        html.push_str(&format!(r#"<a class="next" href="{}">Load more</a>"#, next));
    }
    html.push_str("</body></html>");
    html
}

fn detail_page(category: &str, title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <nav class="breadcrumb">Home / {category} / Lisbon</nav>
            <h1>{title}</h1>
            <span class="price">{price}</span>
            <span class="area">85 m²</span>
            <span class="rooms">3 rooms</span>
            <span class="location">Lisbon</span>
            <ul class="amenities"><li>Balcony</li><li>Garage</li></ul>
            <span class="reference">REF-{title}</span>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Listing over two pages: ad-3 is a house, ad-4 mirrors ad-1, ad-5 is gone
async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/list",
        listing_page(&["/ad/1", "/ad/2", "/ad/3"], Some("/list/2")),
    )
    .await;
    mount_page(server, "/list/2", listing_page(&["/ad/2", "/ad/4", "/ad/5"], None)).await;

    mount_page(server, "/ad/1", detail_page("Apartment", "Bright loft", "€ 320.000")).await;
    mount_page(server, "/ad/2", detail_page("Apartment", "Garden flat", "€ 275.000")).await;
    mount_page(server, "/ad/3", detail_page("House", "Country house", "€ 410.000")).await;
    mount_page(server, "/ad/4", detail_page("Apartment", "Bright loft", "€ 320.000")).await;
}

#[tokio::test]
async fn test_full_crawl_single_source() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("ads.db");
    let config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());

    let summaries = crawl(&config, "test-hash", &ShutdownCoordinator::new())
        .await
        .expect("Crawl failed");

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.jobs_enqueued, 5);
    assert_eq!(summary.frames_loaded, 2);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.fail_count, 2);
    assert_eq!(summary.duplicate_count, 1);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);

    let store = SqliteAdStore::new(Path::new(&db_path)).unwrap();
    assert_eq!(store.count_ads().unwrap(), 2);

    let run = store.get_latest_run().unwrap().expect("run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.success_count, 2);
    assert_eq!(run.duplicate_count, 1);
    assert_eq!(
        store.count_ads_by_category().unwrap(),
        vec![("apartment".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_crawl_extracts_fields() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/list", listing_page(&["/ad/1"], None)).await;
    mount_page(&mock_server, "/ad/1", detail_page("Apartment", "Bright loft", "€ 320.000")).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());

    crawl(&config, "test-hash", &ShutdownCoordinator::new())
        .await
        .unwrap();

    let store = SqliteAdStore::new(Path::new(&db_path)).unwrap();
    let record = estate_sweep::AdRecord {
        url: format!("{}/ad/1", mock_server.uri()),
        category: "apartment".to_string(),
        title: "Bright loft".to_string(),
        price: Some(320_000),
        area_sqm: Some(85.0),
        rooms: Some(3),
        location: Some("Lisbon".to_string()),
        amenities: vec!["Balcony".to_string(), "Garage".to_string()],
        contact: None,
        reference: Some("REF-Bright loft".to_string()),
    };
    let stored = store
        .get_ad(&record.content_hash())
        .unwrap()
        .expect("ad stored under its content hash");

    assert_eq!(stored.title, "Bright loft");
    assert_eq!(stored.price, Some(320_000));
    assert_eq!(stored.rooms, Some(3));
    assert_eq!(stored.amenities, vec!["Balcony", "Garage"]);
    assert_eq!(stored.url, record.url);
}

#[tokio::test]
async fn test_crawl_respects_ad_limit() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let mut config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());
    config.crawler.worker_count = 1;
    config.crawler.max_ad_count = Some(1);

    let summaries = crawl(&config, "test-hash", &ShutdownCoordinator::new())
        .await
        .unwrap();

    assert_eq!(summaries[0].success_count, 1);
    assert_eq!(summaries[0].stop_reason, StopReason::LimitReached);

    let store = SqliteAdStore::new(Path::new(&db_path)).unwrap();
    assert_eq!(store.count_ads().unwrap(), 1);
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::LimitReached);
}

#[tokio::test]
async fn test_unreachable_seed_recorded_as_failed() {
    let mock_server = MockServer::start().await;
    // Nothing mounted: every path answers 404

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());

    let summaries = crawl(&config, "test-hash", &ShutdownCoordinator::new())
        .await
        .unwrap();
    assert!(summaries.is_empty());

    let store = SqliteAdStore::new(Path::new(&db_path)).unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error_message.unwrap().contains("404"));
    assert_eq!(store.count_ads().unwrap(), 0);
}

#[tokio::test]
async fn test_no_seeds_start_after_shutdown() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());

    let shutdown = ShutdownCoordinator::new();
    shutdown.trigger();

    let summaries = crawl(&config, "test-hash", &shutdown).await.unwrap();
    assert!(summaries.is_empty());

    let store = SqliteAdStore::new(Path::new(&db_path)).unwrap();
    assert!(store.get_latest_run().unwrap().is_none());
}

#[tokio::test]
async fn test_page_param_pagination() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["/ad/2"], None)))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(wiremock::matchers::query_param("page", "3"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        // Past the last page: requested once, never retried on later frames
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/list", listing_page(&["/ad/1"], None)).await;
    mount_page(&mock_server, "/ad/1", detail_page("Apartment", "Bright loft", "€ 320.000")).await;
    mount_page(&mock_server, "/ad/2", detail_page("Apartment", "Garden flat", "€ 275.000")).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let mut config = create_test_config(&mock_server.uri(), db_path.to_str().unwrap());
    config.sources[0].selectors.load_more = None;
    config.sources[0].selectors.page_param = Some("page".to_string());

    let summaries = crawl(&config, "test-hash", &ShutdownCoordinator::new())
        .await
        .unwrap();

    assert_eq!(summaries[0].jobs_enqueued, 2);
    assert_eq!(summaries[0].success_count, 2);
    assert_eq!(summaries[0].frames_loaded, 2);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_invalid_config_rejected_before_opening_store() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("ads.db");
    let mut config = create_test_config("http://127.0.0.1:9", db_path.to_str().unwrap());
    config.crawler.worker_count = 0;

    let result = crawl(&config, "test-hash", &ShutdownCoordinator::new()).await;

    assert!(matches!(
        result,
        Err(SweepError::Config(ConfigError::Validation(_)))
    ));
    assert!(!db_path.exists());
}
