//! Configuration module for Site-Indexer
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and exposes the configured site list through [`SiteRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use site_indexer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("indexer.toml")).unwrap();
//! println!("Indexing {} sites", config.sites.len());
//! ```

mod parser;
mod registry;
mod types;
mod validation;

// Re-export types
pub use registry::{SiteRegistry, StaticSiteRegistry};
pub use types::{
    Config, IndexingConfig, ServerConfig, SiteEntry, StorageConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
