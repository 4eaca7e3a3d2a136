use serde::Deserialize;

/// Main configuration structure for Site-Indexer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

/// Indexing run behavior
#[derive(Debug, Clone, Deserialize)]
pub struct IndexingConfig {
    /// Delay between page fetches within one site (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Maximum number of pages stored per site in one pass
    #[serde(rename = "max-pages-per-site", default = "default_max_pages")]
    pub max_pages_per_site: u32,

    /// Number of site passes allowed to run concurrently
    #[serde(rename = "parallel-sites", default = "default_parallel_sites")]
    pub parallel_sites: u32,

    /// Deadline for one site's crawl phase in seconds (0 disables it)
    #[serde(rename = "site-timeout", default)]
    pub site_timeout: u64,

    /// Whether robots.txt directives are honoured
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            request_delay: default_request_delay(),
            max_pages_per_site: default_max_pages(),
            parallel_sites: default_parallel_sites(),
            site_timeout: 0,
            respect_robots: true,
        }
    }
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

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// HTTP front end configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// One configured website
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteEntry {
    /// Display name
    pub name: String,

    /// Canonical root URL
    pub url: String,
}

impl SiteEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

fn default_request_delay() -> u64 {
    500
}

fn default_max_pages() -> u32 {
    500
}

fn default_parallel_sites() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}
