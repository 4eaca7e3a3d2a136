//! URL handling module for Site-Indexer
//!
//! This module provides URL normalization, same-site checks, and the
//! site-relative path form stored on page records.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_site, site_relative_path};
pub use normalize::normalize_url;
