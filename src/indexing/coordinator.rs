//! Run orchestration loop
//!
//! Drives one indexing run over the configured sites: dispatches a site
//! pass per site, honours cancellation between sites, and tallies outcomes.

use crate::config::SiteEntry;
use crate::crawler::Crawl;
use crate::indexing::site_pass::{index_site, SiteOutcome};
use crate::indexing::{IndexSettings, RunSummary};
use crate::storage::SharedStorage;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Indexes every site in `sites`, at most `settings.parallel_sites` at a time
///
/// With one parallel site the passes run strictly in configured order. Once
/// the token is cancelled, sites that have not started are skipped and the
/// run ends after any in-flight pass reaches its next checkpoint.
///
/// # Arguments
///
/// * `run_id` - Identifier of the run, used for logging and the summary
/// * `storage` - Persistence for site and page records
/// * `crawler` - The crawl capability
/// * `sites` - Sites to index; URLs must be distinct
/// * `cancel` - Run cancellation token
/// * `settings` - Concurrency and deadline settings
pub async fn run_sites(
    run_id: u64,
    storage: &SharedStorage,
    crawler: &dyn Crawl,
    sites: Vec<SiteEntry>,
    cancel: &CancellationToken,
    settings: &IndexSettings,
) -> RunSummary {
    let total = sites.len();
    tracing::info!("Run {}: indexing {} sites", run_id, total);

    let outcomes: Vec<Option<SiteOutcome>> = futures::stream::iter(sites)
        .map(|entry| async move {
            if cancel.is_cancelled() {
                tracing::debug!("Run {}: skipping {} after stop", run_id, entry.url);
                return None;
            }
            Some(index_site(storage, crawler, &entry, cancel, settings.site_timeout).await)
        })
        .buffer_unordered(settings.parallel_sites.max(1))
        .collect()
        .await;

    let mut summary = RunSummary::new(run_id);
    for outcome in outcomes {
        match outcome {
            Some(SiteOutcome::Indexed { .. }) => summary.indexed += 1,
            Some(SiteOutcome::Failed { .. }) => summary.failed += 1,
            Some(SiteOutcome::Cancelled { .. }) => summary.interrupted += 1,
            None => summary.skipped += 1,
        }
    }
    summary.cancelled = cancel.is_cancelled();

    if summary.cancelled {
        tracing::info!(
            "Run {} stopped: {} indexed, {} failed, {} interrupted, {} skipped",
            run_id,
            summary.indexed,
            summary.failed,
            summary.interrupted,
            summary.skipped
        );
    } else {
        tracing::info!(
            "Run {} complete: {} indexed, {} failed",
            run_id,
            summary.indexed,
            summary.failed
        );
    }

    summary
}
