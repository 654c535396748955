//! Page fetcher capability and its HTTP adapter
//!
//! The pipeline only talks to [`PageFetcher`] and [`ListingSession`]. The
//! HTTP adapter behind them handles:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for listing and detail pages
//! - Listing pagination (load-more links or a page query parameter)
//! - Error classification into [`FetchError`]

use crate::config::{SourceEntry, UserAgentConfig};
use crate::crawler::parser::{extract_ad_links, extract_ad_record, find_next_link, SiteSelectors};
use crate::record::AdRecord;
use crate::url::same_host;
use crate::SweepError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure to fetch or interpret one page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    /// The page loaded but is not a listing of the expected category
    #[error("{url} is not a {expected} listing")]
    CategoryMismatch { url: String, expected: String },

    #[error("{url} has no {field}")]
    MissingField { url: String, field: &'static str },
}

impl FetchError {
    /// True for outcomes that are expected on real sites and logged quietly
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::CategoryMismatch { .. } | Self::MissingField { .. }
        )
    }
}

/// Source of listing pages and ad detail pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigates to a seed listing page
    async fn open_listing(&self, seed_url: &str) -> Result<Box<dyn ListingSession>, FetchError>;

    /// Fetches one ad page and extracts its record
    async fn fetch_detail(&self, url: &str) -> Result<AdRecord, FetchError>;
}

/// An open listing page that can reveal more content incrementally
#[async_trait]
pub trait ListingSession: Send {
    /// Size of the content revealed so far
    ///
    /// Only compared with earlier values of the same session: an unchanged
    /// height after [`load_more`](Self::load_more) means nothing new appeared.
    async fn content_height(&mut self) -> Result<u64, FetchError>;

    /// Asks the page for more content
    async fn load_more(&mut self) -> Result<(), FetchError>;

    /// Every ad link visible so far, as absolute URLs
    async fn extract_links(&mut self) -> Result<Vec<String>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total timeout of one request
///
/// # Example
///
/// ```no_run
/// use estate_sweep::config::UserAgentConfig;
/// use estate_sweep::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "EstateSweep".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/bot".to_string(),
///     contact_email: "bot@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(15)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] for one configured source, over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    selectors: Arc<SiteSelectors>,
    category: String,
}

impl HttpPageFetcher {
    pub fn new(
        source: &SourceEntry,
        user_agent: &UserAgentConfig,
        fetch_timeout: Duration,
    ) -> Result<Self, SweepError> {
        let client = build_http_client(user_agent, fetch_timeout)?;
        Self::with_client(client, source)
    }

    /// Uses an already configured client
    pub fn with_client(client: Client, source: &SourceEntry) -> Result<Self, SweepError> {
        Ok(Self {
            client,
            selectors: Arc::new(SiteSelectors::compile(&source.selectors)?),
            category: source.category.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn open_listing(&self, seed_url: &str) -> Result<Box<dyn ListingSession>, FetchError> {
        let seed = Url::parse(seed_url).map_err(|e| FetchError::Navigation {
            url: seed_url.to_string(),
            message: e.to_string(),
        })?;

        let page = get_page(&self.client, seed.as_str()).await?;
        tracing::debug!("Opened listing {} ({} bytes)", page.url, page.body.len());

        Ok(Box::new(HttpListingSession {
            client: self.client.clone(),
            selectors: Arc::clone(&self.selectors),
            seed,
            pages: vec![page],
            next_page: 2,
            exhausted: false,
        }))
    }

    async fn fetch_detail(&self, url: &str) -> Result<AdRecord, FetchError> {
        let page = get_page(&self.client, url).await?;
        extract_ad_record(&page.body, url, &self.selectors, &self.category)
    }
}

#[derive(Debug)]
struct LoadedPage {
    url: Url,
    body: String,
}

/// Listing pages loaded so far for one seed
///
/// Bodies are kept as text; documents are parsed inside synchronous helpers
/// so no parsed tree lives across an await.
struct HttpListingSession {
    client: Client,
    selectors: Arc<SiteSelectors>,
    seed: Url,
    pages: Vec<LoadedPage>,
    next_page: u32,
    /// Set once a next page answered 404 or 410
    exhausted: bool,
}

impl HttpListingSession {
    /// Where the next batch of ads lives, if anywhere
    fn next_url(&self) -> Option<Url> {
        if self.exhausted {
            return None;
        }
        let last = self.pages.last()?;

        if let Some(load_more) = &self.selectors.load_more {
            if let Some(next) = find_next_link(&last.body, &last.url, load_more) {
                if same_host(&next, &self.seed) {
                    return Some(next);
                }
                tracing::debug!("Ignoring off-site load-more link {}", next);
            }
        }

        let param = self.selectors.page_param.as_deref()?;
        let kept: Vec<(String, String)> = self
            .seed
            .query_pairs()
            .filter(|(key, _)| key != param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.seed.clone();
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            for (key, value) in &kept {
                query.append_pair(key, value);
            }
            query.append_pair(param, &self.next_page.to_string());
        }
        Some(url)
    }

    fn is_loaded(&self, url: &Url) -> bool {
        self.pages.iter().any(|page| &page.url == url)
    }
}

#[async_trait]
impl ListingSession for HttpListingSession {
    async fn content_height(&mut self) -> Result<u64, FetchError> {
        Ok(self.pages.iter().map(|page| page.body.len() as u64).sum())
    }

    async fn load_more(&mut self) -> Result<(), FetchError> {
        let Some(next) = self.next_url() else {
            tracing::trace!("No further listing pages after {}", self.seed);
            return Ok(());
        };

        if self.is_loaded(&next) {
            tracing::trace!("Listing page {} already loaded", next);
            return Ok(());
        }

        let page = match get_page(&self.client, next.as_str()).await {
            Ok(page) => page,
            Err(FetchError::Status { status: 404 | 410, .. }) => {
                tracing::debug!("Listing page {} is gone, no further pages", next);
                self.exhausted = true;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Loaded listing page {} ({} bytes)", page.url, page.body.len());
        self.pages.push(page);
        self.next_page += 1;
        Ok(())
    }

    async fn extract_links(&mut self) -> Result<Vec<String>, FetchError> {
        Ok(self
            .pages
            .iter()
            .flat_map(|page| extract_ad_links(&page.body, &page.url, &self.selectors.ad_link))
            .collect())
    }
}

/// GETs a page and returns its final URL and body
async fn get_page(client: &Client, url: &str) -> Result<LoadedPage, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_transport_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport_error(url, e))?;

    Ok(LoadedPage {
        url: final_url,
        body,
    })
}

fn classify_transport_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Navigation {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
