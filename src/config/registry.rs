//! Site registry: read-only access to the configured site list

use crate::config::types::{Config, SiteEntry};

/// Source of the sites an indexing run processes
///
/// Every call returns the full list in configured order, so a run can be
/// restarted from the beginning at any time.
pub trait SiteRegistry: Send + Sync {
    fn sites(&self) -> Vec<SiteEntry>;
}

/// Registry backed by a fixed list, normally the `[[sites]]` table
#[derive(Debug, Clone, Default)]
pub struct StaticSiteRegistry {
    sites: Vec<SiteEntry>,
}

impl StaticSiteRegistry {
    pub fn new(sites: Vec<SiteEntry>) -> Self {
        Self { sites }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sites.clone())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl SiteRegistry for StaticSiteRegistry {
    fn sites(&self) -> Vec<SiteEntry> {
        self.sites.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_are_ordered_and_restartable() {
        let registry = StaticSiteRegistry::new(vec![
            SiteEntry::new("B", "http://b.test"),
            SiteEntry::new("A", "http://a.test"),
        ]);

        let first = registry.sites();
        let second = registry.sites();

        assert_eq!(first, second);
        assert_eq!(first[0].name, "B");
        assert_eq!(first[1].name, "A");
        assert_eq!(registry.len(), 2);
    }
}
