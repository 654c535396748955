//! Configuration loading from files

use estate_sweep::config::{load_config, load_config_with_hash, validate, StallPolicy};
use estate_sweep::crawler::{HttpPageFetcher, RunConfig};
use estate_sweep::ConfigError;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

fn example_config_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/sweep.example.toml"))
}

#[test]
fn test_example_config_loads() {
    let (config, hash) = load_config_with_hash(example_config_path()).unwrap();

    assert_eq!(hash.len(), 64);
    assert_eq!(config.crawler.worker_count, 4);
    assert_eq!(config.crawler.stall_policy, StallPolicy::Continue);
    assert_eq!(config.output.summary_path.as_deref(), Some("./summary.md"));
    assert_eq!(config.sources.len(), 1);
    assert_eq!(config.sources[0].category, "apartment");
}

#[test]
fn test_example_config_builds_run_config_and_fetcher() {
    let config = load_config(example_config_path()).unwrap();
    let run = RunConfig::from_crawler(&config.crawler);

    assert_eq!(run.worker_count, 4);
    assert_eq!(run.max_ad_count, Some(50));
    assert_eq!(run.fetch_timeout, Duration::from_secs(15));
    assert_eq!(run.run_timeout, Some(Duration::from_secs(1800)));

    let fetcher = HttpPageFetcher::new(&config.sources[0], &config.user_agent, run.fetch_timeout);
    assert!(fetcher.is_ok());
}

#[test]
fn test_override_is_revalidated() {
    let mut config = load_config(example_config_path()).unwrap();
    config.crawler.worker_count = 500;
    assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

    config.crawler.worker_count = 8;
    config.crawler.max_ad_count = Some(0);
    assert!(validate(&config).is_err());
}

#[test]
fn test_bad_selector_rejected() {
    let content = std::fs::read_to_string(example_config_path())
        .unwrap()
        .replace(r#"title = "h1""#, r#"title = "h1[""#);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let result = load_config(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidSelector(_))));
}

#[test]
fn test_non_http_seed_rejected() {
    let content = std::fs::read_to_string(example_config_path())
        .unwrap()
        .replace("https://homes.example.com/apartments", "ftp://homes.example.com/");
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();

    let result = load_config(file.path());
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}
