//! Output module for status reports
//!
//! This module handles:
//! - Collecting per-site indexing status and page counts
//! - Printing statistics for the command line

pub mod stats;

pub use stats::{load_statistics, print_statistics, IndexingStatistics, SiteSummary};
