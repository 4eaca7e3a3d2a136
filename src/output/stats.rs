//! Indexing statistics from the site and page tables
//!
//! Backs the status endpoint and the `--stats` command.

use crate::state::SiteStatus;
use crate::storage::{Storage, StorageResult};
use serde::Serialize;
use std::collections::HashMap;

/// Indexing status summary
#[derive(Debug, Clone, Serialize)]
pub struct IndexingStatistics {
    /// Whether an indexing run is active
    pub indexing: bool,

    /// Number of site records
    pub total_sites: u64,

    /// Number of page records across all sites
    pub total_pages: u64,

    /// Count of sites by status
    pub sites_by_status: HashMap<SiteStatus, u64>,

    /// Per-site detail, ordered by site ID
    pub sites: Vec<SiteSummary>,
}

/// Status detail for one site record
#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub name: String,
    pub url: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: Option<String>,
    pub pages: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `indexing` - Whether a run is currently active
///
/// # Returns
///
/// * `Ok(IndexingStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage, indexing: bool) -> StorageResult<IndexingStatistics> {
    let records = storage.list_sites()?;
    let total_pages = storage.count_total_pages()?;

    let mut sites_by_status = HashMap::new();
    let mut sites = Vec::with_capacity(records.len());

    for site in records {
        *sites_by_status.entry(site.status).or_insert(0) += 1;
        let pages = storage.count_pages_by_site(site.id)?;
        sites.push(SiteSummary {
            name: site.name,
            url: site.url,
            status: site.status,
            status_time: site.status_time,
            last_error: site.last_error,
            pages,
        });
    }

    Ok(IndexingStatistics {
        indexing,
        total_sites: sites.len() as u64,
        total_pages,
        sites_by_status,
        sites,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &IndexingStatistics) {
    println!("=== Indexing Statistics ===\n");

    println!("Overview:");
    println!("  Indexing in progress: {}", if stats.indexing { "yes" } else { "no" });
    println!("  Sites: {}", stats.total_sites);
    println!("  Pages: {}", stats.total_pages);
    println!();

    println!("Sites by Status:");
    for status in SiteStatus::all_statuses() {
        let count = stats.sites_by_status.get(&status).copied().unwrap_or(0);
        println!("  {}: {}", status, count);
    }
    println!();

    if !stats.sites.is_empty() {
        println!("Sites:");
        for site in &stats.sites {
            println!(
                "  - {} ({}): {} since {}, {} pages",
                site.name, site.url, site.status, site.status_time, site.pages
            );
            if let Some(error) = &site.last_error {
                println!("    last error: {}", error);
            }
        }
        println!();
    }

    let indexed = stats
        .sites_by_status
        .get(&SiteStatus::Indexed)
        .copied()
        .unwrap_or(0);
    let success_rate = if stats.total_sites > 0 {
        (indexed as f64 / stats.total_sites as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} sites indexed)",
        success_rate, indexed, stats.total_sites
    );
}
