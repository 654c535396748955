use serde::Deserialize;

/// Main configuration structure for Estate-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// What the list producer does when a frame reveals no new content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StallPolicy {
    /// Keep looping until the frame budget is spent
    #[default]
    Continue,
    /// End the frame loop at the first stalled frame
    Stop,
}

/// Crawl pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent detail-page workers
    #[serde(rename = "worker-count", default = "default_worker_count")]
    pub worker_count: u32,

    /// Stop the run once this many new ads have been stored
    #[serde(rename = "max-ad-count", default)]
    pub max_ad_count: Option<u64>,

    /// Maximum number of listing frames to reveal per seed
    #[serde(rename = "frame-budget", default = "default_frame_budget")]
    pub frame_budget: u32,

    /// Timeout for a single listing or detail fetch (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Ceiling on the wall-clock duration of one run (seconds)
    #[serde(rename = "run-timeout-secs", default)]
    pub run_timeout_secs: Option<u64>,

    /// Buffer size of the job queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: u32,

    #[serde(rename = "stall-policy", default)]
    pub stall_policy: StallPolicy,
}

fn default_worker_count() -> u32 {
    1
}

fn default_frame_budget() -> u32 {
    10
}

fn default_fetch_timeout_ms() -> u64 {
    15_000
}

fn default_queue_capacity() -> u32 {
    1
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// A classifieds site section to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Short name used in logs and the run ledger
    pub name: String,

    /// Expected property category of every ad (e.g. "apartment")
    pub category: String,

    /// Listing URLs to start from
    pub seeds: Vec<String>,

    pub selectors: SelectorConfig,
}

/// CSS selectors for one source site
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Anchors pointing at ad detail pages on a listing page
    #[serde(rename = "ad-link")]
    pub ad_link: String,

    /// "Load more" or "next page" anchor on a listing page
    #[serde(rename = "load-more", default)]
    pub load_more: Option<String>,

    /// Query parameter used for explicit pagination
    #[serde(rename = "page-param", default)]
    pub page_param: Option<String>,

    /// Element whose text must mention the expected category
    #[serde(default)]
    pub category: Option<String>,

    pub title: String,

    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub area: Option<String>,

    #[serde(default)]
    pub rooms: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub amenities: Option<String>,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub reference: Option<String>,
}

impl SelectorConfig {
    /// Returns every configured selector with its key, for validation and compilation
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        let mut entries = vec![("ad-link", self.ad_link.as_str()), ("title", self.title.as_str())];
        let optional = [
            ("load-more", &self.load_more),
            ("category", &self.category),
            ("price", &self.price),
            ("area", &self.area),
            ("rooms", &self.rooms),
            ("location", &self.location),
            ("amenities", &self.amenities),
            ("contact", &self.contact),
            ("reference", &self.reference),
        ];
        for (key, value) in optional {
            if let Some(selector) = value {
                entries.push((key, selector.as_str()));
            }
        }
        entries
    }
}
