//! Per-site indexing pass
//!
//! Replaces one site's persisted data with freshly crawled content:
//! purge the previous record and its pages, seed a new INDEXING record,
//! store every crawled page, then finalize the status.

use crate::config::SiteEntry;
use crate::crawler::{Crawl, CrawlError, CrawledPage};
use crate::state::SiteStatus;
use crate::storage::{lock, SharedStorage, StorageResult};
use crate::url::normalize_url;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How one site pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    /// Crawl exhausted without a fatal error
    Indexed { site_id: i64, pages: u64 },
    /// Crawl or storage failure, recorded on the site when it exists
    Failed { site_id: Option<i64>, error: String },
    /// Stop was observed at a checkpoint; the site keeps its last status
    Cancelled { site_id: Option<i64> },
}

impl SiteOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Where the crawl phase stopped
enum CrawlEnd {
    Completed(u64),
    Failed(String),
    Cancelled,
}

/// Runs the purge, seed, crawl and finalize steps for one site
///
/// The site is identified by its normalized URL, so every spelling that
/// normalizes the same way purges and reseeds one record.
///
/// The token is checked before purging, between purge and seed, before the
/// crawl, and while waiting for every page of the crawl. Errors never escape
/// this function; they are recorded on the site record and returned as the
/// outcome.
///
/// # Arguments
///
/// * `storage` - Persistence for site and page records
/// * `crawler` - The crawl capability to consume
/// * `entry` - Configured name and URL of the site
/// * `cancel` - Run cancellation token
/// * `site_timeout` - Optional deadline for the crawl phase
pub async fn index_site(
    storage: &SharedStorage,
    crawler: &dyn Crawl,
    entry: &SiteEntry,
    cancel: &CancellationToken,
    site_timeout: Option<Duration>,
) -> SiteOutcome {
    if cancel.is_cancelled() {
        return SiteOutcome::Cancelled { site_id: None };
    }

    let site_url = match normalize_url(&entry.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Skipping site {}: {}", entry.name, e);
            return SiteOutcome::Failed {
                site_id: None,
                error: CrawlError::InvalidUrl(entry.url.clone()).to_string(),
            };
        }
    };

    tracing::info!("Indexing site {} ({})", entry.name, site_url);

    match purge_site(storage, site_url.as_str()) {
        Ok(Some((site_id, pages))) => {
            tracing::debug!(
                "Purged site {} ({} stale pages) for {}",
                site_id,
                pages,
                site_url
            );
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Failed to purge {}: {}", site_url, e);
            return SiteOutcome::Failed {
                site_id: None,
                error: e.to_string(),
            };
        }
    }

    if cancel.is_cancelled() {
        tracing::info!("Indexing of {} cancelled after purge", site_url);
        return SiteOutcome::Cancelled { site_id: None };
    }

    let site_id = match seed_site(storage, &entry.name, site_url.as_str()) {
        Ok(site_id) => site_id,
        Err(e) => {
            tracing::error!("Failed to create site record for {}: {}", site_url, e);
            return SiteOutcome::Failed {
                site_id: None,
                error: e.to_string(),
            };
        }
    };

    if cancel.is_cancelled() {
        tracing::info!("Indexing of {} cancelled before crawl", site_url);
        return SiteOutcome::Cancelled {
            site_id: Some(site_id),
        };
    }

    match crawl_pages(storage, crawler, site_id, &site_url, cancel, site_timeout).await {
        CrawlEnd::Completed(pages) => {
            if let Err(e) = finalize_site(storage, site_id, SiteStatus::Indexed, None) {
                tracing::error!("Failed to finalize site {}: {}", site_url, e);
                return SiteOutcome::Failed {
                    site_id: Some(site_id),
                    error: e.to_string(),
                };
            }
            tracing::info!("Indexed {} ({} pages)", site_url, pages);
            SiteOutcome::Indexed { site_id, pages }
        }
        CrawlEnd::Failed(error) => {
            tracing::warn!("Indexing of {} failed: {}", site_url, error);
            if let Err(e) = finalize_site(storage, site_id, SiteStatus::Failed, Some(&error)) {
                tracing::error!("Failed to record failure for {}: {}", site_url, e);
            }
            SiteOutcome::Failed {
                site_id: Some(site_id),
                error,
            }
        }
        CrawlEnd::Cancelled => {
            tracing::info!(
                "Indexing of {} cancelled mid-crawl; site left {}",
                site_url,
                SiteStatus::Indexing
            );
            SiteOutcome::Cancelled {
                site_id: Some(site_id),
            }
        }
    }
}

/// Deletes the existing record for `url` and all of its pages
///
/// # Returns
///
/// The purged site ID and how many pages it owned, or `None` if no record
/// existed
fn purge_site(storage: &SharedStorage, url: &str) -> StorageResult<Option<(i64, u64)>> {
    let mut storage = lock(storage)?;
    let Some(site) = storage.find_site_by_url(url)? else {
        return Ok(None);
    };

    let pages = storage.delete_pages_by_site(site.id)?;
    storage.delete_site(site.id)?;
    Ok(Some((site.id, pages)))
}

fn seed_site(storage: &SharedStorage, name: &str, url: &str) -> StorageResult<i64> {
    let site = lock(storage)?.create_site(name, url, SiteStatus::Indexing)?;
    Ok(site.id)
}

fn store_page(storage: &SharedStorage, site_id: i64, page: &CrawledPage) -> StorageResult<i64> {
    lock(storage)?.save_page(site_id, &page.path, page.status_code, &page.content)
}

fn finalize_site(
    storage: &SharedStorage,
    site_id: i64,
    status: SiteStatus,
    last_error: Option<&str>,
) -> StorageResult<()> {
    lock(storage)?.update_site_status(site_id, status, last_error)
}

async fn crawl_pages(
    storage: &SharedStorage,
    crawler: &dyn Crawl,
    site_id: i64,
    site_url: &Url,
    cancel: &CancellationToken,
    site_timeout: Option<Duration>,
) -> CrawlEnd {
    let deadline = site_timeout.map(|timeout| Instant::now() + timeout);
    let mut stream = crawler.crawl(site_url);
    let mut pages = 0u64;

    loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => return CrawlEnd::Cancelled,
            _ = wait_until(deadline) => {
                let secs = site_timeout.map(|t| t.as_secs()).unwrap_or_default();
                return CrawlEnd::Failed(CrawlError::Timeout(secs).to_string());
            }
            item = stream.next() => item,
        };

        match item {
            None => return CrawlEnd::Completed(pages),
            Some(Ok(page)) => {
                if let Err(e) = store_page(storage, site_id, &page) {
                    return CrawlEnd::Failed(format!("failed to store page {}: {}", page.path, e));
                }
                pages += 1;
                tracing::trace!("Stored {} (HTTP {}) for {}", page.path, page.status_code, site_url);
            }
            Some(Err(e)) => return CrawlEnd::Failed(e.to_string()),
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
