//! Robots.txt handling module
//!
//! Fetches and parses a site's robots.txt once per site pass so the HTTP
//! crawler can skip disallowed paths and honour Crawl-delay.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use url::Url;

/// Fetches robots.txt for a site
///
/// Failures are never fatal: a missing file, a non-success status, or a
/// network error all yield [`ParsedRobots::allow_all`].
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `site_root` - Any URL on the site; only its origin is used
pub async fn fetch_robots(client: &Client, site_root: &Url) -> ParsedRobots {
    let robots_url = match site_root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", site_root, e);
            return ParsedRobots::allow_all();
        }
    };

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => {
                tracing::debug!("Fetched robots.txt for {}", site_root);
                ParsedRobots::from_content(&body)
            }
            Err(e) => {
                tracing::debug!("Failed to read robots.txt for {}: {}", site_root, e);
                ParsedRobots::allow_all()
            }
        },
        Ok(response) => {
            tracing::debug!(
                "No robots.txt for {} (HTTP {})",
                site_root,
                response.status().as_u16()
            );
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!("Failed to fetch robots.txt for {}: {}", site_root, e);
            ParsedRobots::allow_all()
        }
    }
}
