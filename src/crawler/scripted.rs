//! Scripted crawl capability
//!
//! Plays back a fixed sequence of steps per site URL. Used to exercise the
//! indexing protocol without a network.

use crate::crawler::{Crawl, CrawlError, CrawledPage, PageStream};
use crate::url::normalize_url;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// One step of a scripted site crawl
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Yield a page
    Page(CrawledPage),
    /// Yield a fatal error and end the stream
    Fail(String),
    /// Wake whoever waits on this notifier, then continue
    Signal(Arc<Notify>),
    /// Block until this notifier is triggered, then continue
    WaitFor(Arc<Notify>),
}

impl ScriptStep {
    pub fn page(path: &str, status_code: u16, content: &str) -> Self {
        Self::Page(CrawledPage::new(path, status_code, content))
    }
}

/// Crawl capability backed by per-site scripts
///
/// Sites without a script produce an empty stream.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCrawler {
    scripts: HashMap<String, Vec<ScriptStep>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCrawler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the script played back for `site_url`
    pub fn site(mut self, site_url: &str, steps: Vec<ScriptStep>) -> Self {
        self.scripts.insert(script_key(site_url), steps);
        self
    }

    /// Site URLs crawled so far, in call order
    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn script_key(site_url: &str) -> String {
    normalize_url(site_url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| site_url.to_string())
}

impl Crawl for ScriptedCrawler {
    fn crawl(&self, site_url: &Url) -> PageStream {
        let key = script_key(site_url.as_str());
        match self.calls.lock() {
            Ok(mut calls) => calls.push(key.clone()),
            Err(poisoned) => poisoned.into_inner().push(key.clone()),
        }

        let steps: VecDeque<ScriptStep> = self
            .scripts
            .get(&key)
            .cloned()
            .unwrap_or_default()
            .into();

        Box::pin(futures::stream::unfold(steps, |mut steps| async move {
            loop {
                match steps.pop_front()? {
                    ScriptStep::Page(page) => return Some((Ok(page), steps)),
                    ScriptStep::Fail(message) => {
                        steps.clear();
                        return Some((Err(CrawlError::Fatal(message)), steps));
                    }
                    ScriptStep::Signal(notify) => notify.notify_one(),
                    ScriptStep::WaitFor(notify) => notify.notified().await,
                }
            }
        }))
    }
}
