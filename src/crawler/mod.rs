//! Crawler module: the capability that turns a site URL into page results
//!
//! This module contains:
//! - The [`Crawl`] trait and the lazy [`PageStream`] it returns
//! - [`HttpCrawler`], which walks a site over HTTP with politeness delays
//! - HTML link extraction and the HTTP fetcher it is built on
//! - [`ScriptedCrawler`], a deterministic capability for tests and demos

mod fetcher;
mod parser;
mod scripted;
mod site_crawler;

pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use parser::extract_links;
pub use scripted::{ScriptStep, ScriptedCrawler};
pub use site_crawler::{CrawlSettings, HttpCrawler};

use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use url::Url;

/// One fetched resource of a site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledPage {
    /// Path relative to the site root, including any query string
    pub path: String,
    /// HTTP status code of the response
    pub status_code: u16,
    /// Raw response body
    pub content: String,
}

impl CrawledPage {
    pub fn new(path: impl Into<String>, status_code: u16, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status_code,
            content: content.into(),
        }
    }
}

/// Fatal crawl failures
///
/// A stream that yields one of these is finished for that site; the site is
/// finalized as failed with the error's text as its last error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrawlError {
    #[error("site {url} is unreachable: {message}")]
    Unreachable { url: String, message: String },

    #[error("invalid site URL '{0}'")]
    InvalidUrl(String),

    #[error("crawl timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Fatal(String),
}

/// Lazy sequence of page results for one site
pub type PageStream = Pin<Box<dyn Stream<Item = Result<CrawledPage, CrawlError>> + Send>>;

/// The crawl capability consumed by the site indexer
///
/// Each call starts a fresh, independent crawl of one site. Nothing is
/// fetched until the returned stream is polled.
pub trait Crawl: Send + Sync {
    fn crawl(&self, site_url: &Url) -> PageStream;
}
