//! Integration tests for the indexing run lifecycle
//!
//! These tests drive the run controller with a scripted crawl capability and
//! in-memory SQLite storage, checking persisted site and page state.

use site_indexer::config::{SiteEntry, StaticSiteRegistry};
use site_indexer::crawler::{Crawl, CrawledPage, PageStream, ScriptStep, ScriptedCrawler};
use site_indexer::indexing::{IndexSettings, RunController, RunError};
use site_indexer::normalize_url;
use site_indexer::state::SiteStatus;
use site_indexer::storage::{
    lock, shared, PageRecord, SharedStorage, SiteRecord, SqliteStorage, Storage, StorageResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

fn two_sites() -> Vec<SiteEntry> {
    vec![
        SiteEntry::new("A", "http://a.test"),
        SiteEntry::new("B", "http://b.test"),
    ]
}

fn create_controller(
    storage: SharedStorage,
    crawler: ScriptedCrawler,
    sites: Vec<SiteEntry>,
) -> RunController {
    RunController::new(
        storage,
        Arc::new(crawler),
        Arc::new(StaticSiteRegistry::new(sites)),
        IndexSettings::default(),
    )
}

/// Site URLs are stored normalized
fn stored_url(url: &str) -> String {
    normalize_url(url).unwrap().to_string()
}

fn site_by_url(storage: &SharedStorage, url: &str) -> Option<SiteRecord> {
    lock(storage).unwrap().find_site_by_url(&stored_url(url)).unwrap()
}

fn page_count(storage: &SharedStorage, site_id: i64) -> u64 {
    lock(storage).unwrap().count_pages_by_site(site_id).unwrap()
}

fn sites_with_url(storage: &SharedStorage, url: &str) -> usize {
    lock(storage)
        .unwrap()
        .list_sites()
        .unwrap()
        .into_iter()
        .filter(|site| site.url == stored_url(url))
        .count()
}

#[tokio::test]
async fn test_two_sites_indexed() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let crawler = ScriptedCrawler::new().site(
        "http://a.test",
        vec![
            ScriptStep::page("/", 200, "home"),
            ScriptStep::page("/about", 200, "about"),
        ],
    );
    let controller = create_controller(storage.clone(), crawler, two_sites());

    controller.start().unwrap();
    let summary = controller.join().await.unwrap();

    assert_eq!(summary.indexed, 2);
    assert!(!controller.is_running());

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_eq!(a.status, SiteStatus::Indexed);
    assert_eq!(a.name, "A");
    assert_eq!(page_count(&storage, a.id), 2);

    let b = site_by_url(&storage, "http://b.test").unwrap();
    assert_eq!(b.status, SiteStatus::Indexed);
    assert_eq!(page_count(&storage, b.id), 0);
}

#[tokio::test]
async fn test_start_while_running_leaves_task_alone() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let gate = Arc::new(Notify::new());
    let crawler = ScriptedCrawler::new().site(
        "http://a.test",
        vec![ScriptStep::WaitFor(gate.clone()), ScriptStep::page("/", 200, "home")],
    );
    let controller = create_controller(storage.clone(), crawler, two_sites());

    controller.start().unwrap();
    let rejected = controller.start().unwrap_err();
    assert_eq!(rejected, RunError::AlreadyRunning);
    assert_eq!(rejected.to_string(), "indexing already running");
    assert!(controller.is_running());

    gate.notify_one();
    let summary = controller.join().await.unwrap();

    assert_eq!(summary.run_id, 1);
    assert_eq!(summary.indexed, 2);
    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_eq!(page_count(&storage, a.id), 1);
}

/// Storage wrapper that logs lookups and page writes, and snapshots the
/// state seen by every site creation
struct RecordingStorage {
    inner: SqliteStorage,
    seen_at_create: Arc<Mutex<Vec<(String, usize, u64)>>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingStorage {
    fn new(inner: SqliteStorage) -> Self {
        Self {
            inner,
            seen_at_create: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Storage for RecordingStorage {
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        self.events.lock().unwrap().push(format!("find {}", url));
        self.inner.find_site_by_url(url)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.inner.get_site(site_id)
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        self.inner.list_sites()
    }

    fn create_site(&mut self, name: &str, url: &str, status: SiteStatus) -> StorageResult<SiteRecord> {
        let records = self
            .inner
            .list_sites()?
            .into_iter()
            .filter(|site| site.url == url)
            .count();
        let pages = self.inner.count_total_pages()?;
        self.seen_at_create
            .lock()
            .unwrap()
            .push((url.to_string(), records, pages));
        self.inner.create_site(name, url, status)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        self.inner.update_site_status(site_id, status, last_error)
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.inner.delete_site(site_id)
    }

    fn save_page(&mut self, site_id: i64, path: &str, code: u16, content: &str) -> StorageResult<i64> {
        self.events.lock().unwrap().push(format!("save {}", path));
        self.inner.save_page(site_id, path, code, content)
    }

    fn delete_pages_by_site(&mut self, site_id: i64) -> StorageResult<u64> {
        self.inner.delete_pages_by_site(site_id)
    }

    fn get_pages_by_site(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        self.inner.get_pages_by_site(site_id)
    }

    fn count_pages_by_site(&self, site_id: i64) -> StorageResult<u64> {
        self.inner.count_pages_by_site(site_id)
    }

    fn count_total_pages(&self) -> StorageResult<u64> {
        self.inner.count_total_pages()
    }
}

#[tokio::test]
async fn test_stale_pages_purged_before_seed() {
    let mut inner = SqliteStorage::new_in_memory().unwrap();
    let stale = inner
        .create_site("A", "http://a.test/", SiteStatus::Indexed)
        .unwrap();
    for i in 0..5 {
        inner
            .save_page(stale.id, &format!("/stale{}", i), 200, "old")
            .unwrap();
    }

    let recording = RecordingStorage::new(inner);
    let seen_at_create = recording.seen_at_create.clone();
    let storage = shared(recording);
    let crawler = ScriptedCrawler::new().site(
        "http://a.test",
        vec![ScriptStep::page("/", 200, "new")],
    );
    let controller = create_controller(
        storage.clone(),
        crawler,
        vec![SiteEntry::new("A", "http://a.test")],
    );

    controller.start().unwrap();
    controller.join().await.unwrap();

    let seen = seen_at_create.lock().unwrap().clone();
    assert_eq!(seen, vec![("http://a.test/".to_string(), 0, 0)]);

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_ne!(a.id, stale.id);
    assert_eq!(a.status, SiteStatus::Indexed);
    assert_eq!(page_count(&storage, a.id), 1);
    assert_eq!(sites_with_url(&storage, "http://a.test"), 1);
}

#[tokio::test]
async fn test_url_spellings_keep_one_record() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());

    for (round, url) in ["http://a.test", "http://a.test/", "http://A.test"]
        .into_iter()
        .enumerate()
    {
        let pages = (0..=round)
            .map(|i| ScriptStep::page(&format!("/p{}", i), 200, "page"))
            .collect();
        let crawler = ScriptedCrawler::new().site("http://a.test", pages);
        let controller = create_controller(storage.clone(), crawler, vec![SiteEntry::new("A", url)]);

        controller.start().unwrap();
        let summary = controller.join().await.unwrap();
        assert_eq!(summary.indexed, 1);
    }

    let sites = lock(&storage).unwrap().list_sites().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].url, "http://a.test/");
    assert_eq!(sites[0].status, SiteStatus::Indexed);
    assert_eq!(page_count(&storage, sites[0].id), 3);
    assert_eq!(lock(&storage).unwrap().count_total_pages().unwrap(), 3);
}

/// Crawler whose first crawl blocks its worker thread inside the page
/// stream until released; later crawls yield nothing
struct BlockingOnceCrawler {
    crawls: AtomicUsize,
    entered: Mutex<mpsc::Sender<()>>,
    release: Arc<Mutex<mpsc::Receiver<()>>>,
}

impl Crawl for BlockingOnceCrawler {
    fn crawl(&self, _site_url: &Url) -> PageStream {
        if self.crawls.fetch_add(1, Ordering::SeqCst) > 0 {
            return Box::pin(futures::stream::empty());
        }

        let entered = self.entered.lock().unwrap().clone();
        let release = self.release.clone();
        Box::pin(futures::stream::once(async move {
            entered.send(()).unwrap();
            release.lock().unwrap().recv().unwrap();
            Ok(CrawledPage::new("/slow", 200, "slow"))
        }))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_next_run_waits_for_stopped_task() {
    let recording = RecordingStorage::new(SqliteStorage::new_in_memory().unwrap());
    let events = recording.events.clone();
    let storage = shared(recording);

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let crawler = BlockingOnceCrawler {
        crawls: AtomicUsize::new(0),
        entered: Mutex::new(entered_tx),
        release: Arc::new(Mutex::new(release_rx)),
    };
    let controller = RunController::new(
        storage.clone(),
        Arc::new(crawler),
        Arc::new(StaticSiteRegistry::new(vec![SiteEntry::new("A", "http://a.test")])),
        IndexSettings::default(),
    );

    assert_eq!(controller.start(), Ok(1));
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // Run 1 is stuck inside its crawl step while run 2 is dispatched
    controller.stop().unwrap();
    assert_eq!(controller.start(), Ok(2));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        events.lock().unwrap().clone(),
        vec!["find http://a.test/".to_string()]
    );

    release_tx.send(()).unwrap();
    let summary = controller.join().await.unwrap();
    assert_eq!(summary.run_id, 2);
    assert_eq!(summary.indexed, 1);

    assert_eq!(
        events.lock().unwrap().clone(),
        vec![
            "find http://a.test/".to_string(),
            "save /slow".to_string(),
            "find http://a.test/".to_string(),
        ]
    );

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_eq!(a.status, SiteStatus::Indexed);
    assert_eq!(page_count(&storage, a.id), 0);
}

#[tokio::test]
async fn test_stop_mid_crawl() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let reached = Arc::new(Notify::new());
    let never = Arc::new(Notify::new());
    let crawler = ScriptedCrawler::new()
        .site("http://a.test", vec![ScriptStep::page("/", 200, "a")])
        .site(
            "http://b.test",
            vec![
                ScriptStep::page("/", 200, "b"),
                ScriptStep::Signal(reached.clone()),
                ScriptStep::WaitFor(never),
            ],
        )
        .site("http://c.test", vec![ScriptStep::page("/", 200, "c")]);
    let mut sites = two_sites();
    sites.push(SiteEntry::new("C", "http://c.test"));
    let controller = create_controller(storage.clone(), crawler.clone(), sites);

    controller.start().unwrap();
    reached.notified().await;
    controller.stop().unwrap();
    assert!(!controller.is_running());

    let summary = controller.join().await.unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.interrupted, 1);
    assert_eq!(summary.skipped, 1);

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_eq!(a.status, SiteStatus::Indexed);

    let b = site_by_url(&storage, "http://b.test").unwrap();
    assert_eq!(b.status, SiteStatus::Indexing);
    assert_eq!(page_count(&storage, b.id), 1);

    assert!(site_by_url(&storage, "http://c.test").is_none());
    assert_eq!(crawler.calls(), vec!["http://a.test/", "http://b.test/"]);
}

#[tokio::test]
async fn test_failed_site_does_not_stop_run() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let crawler = ScriptedCrawler::new()
        .site(
            "http://a.test",
            vec![ScriptStep::Fail("connection refused".to_string())],
        )
        .site("http://b.test", vec![ScriptStep::page("/", 200, "b")]);
    let controller = create_controller(storage.clone(), crawler, two_sites());

    controller.start().unwrap();
    let summary = controller.join().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.indexed, 1);

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert_eq!(a.status, SiteStatus::Failed);
    assert!(!a.last_error.unwrap_or_default().is_empty());

    let b = site_by_url(&storage, "http://b.test").unwrap();
    assert_eq!(b.status, SiteStatus::Indexed);
    assert_eq!(page_count(&storage, b.id), 1);
}

#[tokio::test]
async fn test_rerun_keeps_one_record_per_url() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let crawler = ScriptedCrawler::new().site(
        "http://a.test",
        vec![
            ScriptStep::page("/", 200, "home"),
            ScriptStep::page("/about", 200, "about"),
        ],
    );
    let controller = create_controller(storage.clone(), crawler, two_sites());

    for _ in 0..2 {
        controller.start().unwrap();
        controller.join().await.unwrap();
    }

    assert_eq!(sites_with_url(&storage, "http://a.test"), 1);
    assert_eq!(sites_with_url(&storage, "http://b.test"), 1);

    let a = site_by_url(&storage, "http://a.test").unwrap();
    assert!(a.status.is_terminal());
    assert_eq!(page_count(&storage, a.id), 2);
    assert_eq!(lock(&storage).unwrap().count_total_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_start_stop_follow_run_state() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let gate = Arc::new(Notify::new());
    let crawler = ScriptedCrawler::new().site(
        "http://a.test",
        vec![ScriptStep::WaitFor(gate), ScriptStep::page("/", 200, "home")],
    );
    let controller = create_controller(storage, crawler, two_sites());

    // true = start, false = stop
    let calls = [
        false, true, true, false, false, true, false, true, true, true, false, false,
    ];
    let mut running = false;

    for is_start in calls {
        if is_start {
            let result = controller.start();
            assert_eq!(result.is_ok(), !running);
            if running {
                assert_eq!(result, Err(RunError::AlreadyRunning));
            }
            running = true;
        } else {
            let result = controller.stop();
            assert_eq!(result.is_ok(), running);
            if !running {
                assert_eq!(result, Err(RunError::NotRunning));
            }
            running = false;
        }
        assert_eq!(controller.is_running(), running);
    }

    let summary = controller.shutdown().await.unwrap();
    assert!(summary.cancelled);
    assert!(!controller.is_running());
}

#[tokio::test]
async fn test_stop_twice_reports_not_running() {
    let storage = shared(SqliteStorage::new_in_memory().unwrap());
    let gate = Arc::new(Notify::new());
    let crawler = ScriptedCrawler::new().site("http://a.test", vec![ScriptStep::WaitFor(gate)]);
    let controller = create_controller(storage, crawler, two_sites());

    controller.start().unwrap();
    assert_eq!(controller.stop(), Ok(()));

    let second = controller.stop().unwrap_err();
    assert_eq!(second.to_string(), "indexing not running");

    controller.join().await;
}
