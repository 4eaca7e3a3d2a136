//! HTTP implementation of the crawl capability
//!
//! Walks one site breadth-first from its root, staying on the root's
//! origin, honouring robots.txt, and pausing between requests.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::parser::extract_links;
use crate::crawler::{Crawl, CrawlError, CrawledPage, PageStream};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::{is_same_site, normalize_url, site_relative_path};
use crate::IndexerError;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

/// Per-crawl limits and politeness settings
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Product token matched against robots.txt user-agent groups
    pub robots_agent: String,
    /// Minimum pause between two requests to the site
    pub request_delay: Duration,
    /// Maximum number of pages yielded per crawl
    pub max_pages: u32,
    pub respect_robots: bool,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            robots_agent: config.user_agent.crawler_name.clone(),
            request_delay: Duration::from_millis(config.indexing.request_delay),
            max_pages: config.indexing.max_pages_per_site,
            respect_robots: config.indexing.respect_robots,
        }
    }
}

/// Crawls sites over HTTP with reqwest
#[derive(Clone)]
pub struct HttpCrawler {
    client: Client,
    settings: CrawlSettings,
}

impl HttpCrawler {
    pub fn new(client: Client, settings: CrawlSettings) -> Self {
        Self { client, settings }
    }

    /// Builds a crawler with the configured user agent and limits
    pub fn from_config(config: &Config) -> Result<Self, IndexerError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::new(client, CrawlSettings::from_config(config)))
    }
}

impl Crawl for HttpCrawler {
    fn crawl(&self, site_url: &Url) -> PageStream {
        let state = CrawlState::new(self.client.clone(), self.settings.clone(), site_url.clone());

        Box::pin(futures::stream::unfold(state, |mut state| async move {
            let item = state.next_page().await?;
            Some((item, state))
        }))
    }
}

/// Frontier and bookkeeping for one site crawl
///
/// Queued URLs are fetched as resolved; `seen` holds their normalized form.
struct CrawlState {
    client: Client,
    settings: CrawlSettings,
    root: Url,
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    robots: Option<ParsedRobots>,
    delay: Duration,
    attempts: u32,
    yielded: u32,
    done: bool,
}

impl CrawlState {
    fn new(client: Client, settings: CrawlSettings, site_url: Url) -> Self {
        let mut root = site_url;
        root.set_fragment(None);
        let mut seen = HashSet::new();
        seen.insert(dedup_key(&root));

        Self {
            client,
            delay: settings.request_delay,
            settings,
            queue: VecDeque::from([root.clone()]),
            root,
            seen,
            robots: None,
            attempts: 0,
            yielded: 0,
            done: false,
        }
    }

    async fn next_page(&mut self) -> Option<Result<CrawledPage, CrawlError>> {
        if self.done {
            return None;
        }

        if self.robots.is_none() {
            self.load_robots().await;
        }

        while let Some(url) = self.queue.pop_front() {
            if self.yielded >= self.settings.max_pages {
                tracing::debug!(
                    "Page limit {} reached for {}",
                    self.settings.max_pages,
                    self.root
                );
                break;
            }

            if let Some(robots) = &self.robots {
                if !robots.is_allowed(url.as_str(), &self.settings.robots_agent) {
                    tracing::debug!("URL {} disallowed by robots.txt", url);
                    continue;
                }
            }

            if self.attempts > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.attempts += 1;
            let is_root = self.attempts == 1;

            let result = fetch_url(&self.client, &url).await;
            let followable = result.is_followable();

            match result {
                FetchResult::Page {
                    final_url,
                    status_code,
                    body,
                    ..
                } => {
                    if followable {
                        self.enqueue_links(&body, &final_url);
                    }
                    self.yielded += 1;
                    return Some(Ok(CrawledPage {
                        path: site_relative_path(&url),
                        status_code,
                        content: body,
                    }));
                }
                FetchResult::ContentMismatch {
                    status_code,
                    content_type,
                } => {
                    tracing::debug!(
                        "Skipping {} (HTTP {}, content type {})",
                        url,
                        status_code,
                        content_type
                    );
                }
                FetchResult::NetworkError { error } => {
                    if is_root {
                        self.done = true;
                        return Some(Err(CrawlError::Unreachable {
                            url: url.to_string(),
                            message: error,
                        }));
                    }
                    tracing::warn!("Skipping {}: {}", url, error);
                }
            }
        }

        self.done = true;
        None
    }

    async fn load_robots(&mut self) {
        let robots = if self.settings.respect_robots {
            fetch_robots(&self.client, &self.root).await
        } else {
            ParsedRobots::allow_all()
        };

        let crawl_delay = robots
            .crawl_delay(&self.settings.robots_agent)
            .filter(|seconds| seconds.is_finite());
        if let Some(seconds) = crawl_delay {
            let requested = Duration::from_secs_f64(seconds.clamp(0.0, 60.0));
            if requested > self.delay {
                tracing::debug!("Using robots.txt crawl delay {:?} for {}", requested, self.root);
                self.delay = requested;
            }
        }

        self.robots = Some(robots);
    }

    fn enqueue_links(&mut self, body: &str, base: &Url) {
        for mut link in extract_links(body, base) {
            let Ok(normalized) = normalize_url(link.as_str()) else {
                continue;
            };
            if !is_same_site(&self.root, &normalized) {
                continue;
            }
            if self.seen.insert(normalized.to_string()) {
                link.set_fragment(None);
                self.queue.push_back(link);
            }
        }
    }
}

/// Key under which a URL is deduplicated; falls back to the URL itself
fn dedup_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|normalized| normalized.to_string())
        .unwrap_or_else(|_| url.to_string())
}
