//! Indexing module: run lifecycle and the per-site protocol
//!
//! This module contains:
//! - [`RunController`], the single-flight start/stop state machine
//! - [`run_sites`], the loop that drives one run across all sites
//! - [`index_site`], the purge, seed, crawl and finalize pass for one site

mod controller;
mod coordinator;
mod site_pass;

pub use controller::RunController;
pub use coordinator::run_sites;
pub use site_pass::{index_site, SiteOutcome};

use crate::config::Config;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to whoever triggers a start or stop
///
/// The messages are the exact texts returned by the HTTP front end.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RunError {
    #[error("indexing already running")]
    AlreadyRunning,

    #[error("indexing not running")]
    NotRunning,

    #[error("failed to start indexing")]
    DispatchError,
}

/// Settings shared by every site pass of a run
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Number of site passes allowed to run concurrently
    pub parallel_sites: usize,
    /// Deadline for the crawl phase of one site
    pub site_timeout: Option<Duration>,
}

impl IndexSettings {
    pub fn from_config(config: &Config) -> Self {
        let site_timeout = match config.indexing.site_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            parallel_sites: config.indexing.parallel_sites as usize,
            site_timeout,
        }
    }
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            parallel_sites: 1,
            site_timeout: None,
        }
    }
}

/// Outcome counts of one finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: u64,
    /// Sites finalized as INDEXED
    pub indexed: usize,
    /// Sites finalized as FAILED, or that failed before a record existed
    pub failed: usize,
    /// Sites whose pass was cut short by a stop
    pub interrupted: usize,
    /// Sites never started because the run was stopped
    pub skipped: usize,
    /// Whether the run ended because of a stop
    pub cancelled: bool,
}

impl RunSummary {
    pub fn new(run_id: u64) -> Self {
        Self {
            run_id,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const BASE_CONFIG: &str = r#"
[user-agent]
crawler-name = "TestIndexer"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[storage]
database-path = "./test.db"
"#;

    #[test]
    fn test_settings_from_defaults() {
        let config = parse_config(BASE_CONFIG).unwrap();
        let settings = IndexSettings::from_config(&config);

        assert_eq!(settings.parallel_sites, 1);
        assert_eq!(settings.site_timeout, None);
    }

    #[test]
    fn test_settings_with_timeout() {
        let content = format!("[indexing]\nparallel-sites = 4\nsite-timeout = 30\n{}", BASE_CONFIG);
        let config = parse_config(&content).unwrap();
        let settings = IndexSettings::from_config(&config);

        assert_eq!(settings.parallel_sites, 4);
        assert_eq!(settings.site_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_run_error_messages() {
        assert_eq!(RunError::AlreadyRunning.to_string(), "indexing already running");
        assert_eq!(RunError::NotRunning.to_string(), "indexing not running");
        assert_eq!(RunError::DispatchError.to_string(), "failed to start indexing");
    }
}
