//! Run controller: single-flight start/stop of the indexing task
//!
//! The controller owns the only process-wide run state. All transitions
//! happen under one mutex:
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Idle | `start()` | Running |
//! | Running | `stop()` | Idle |
//! | Running | task completion | Idle |
//!
//! A stopped task may still be finishing its current checkpoint. The next
//! run waits for it before touching any site.

use crate::config::SiteRegistry;
use crate::crawler::Crawl;
use crate::indexing::coordinator::run_sites;
use crate::indexing::{IndexSettings, RunError, RunSummary};
use crate::state::RunState;
use crate::storage::SharedStorage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the active flag and the handle of the indexing task
pub struct RunController {
    storage: SharedStorage,
    crawler: Arc<dyn Crawl>,
    registry: Arc<dyn SiteRegistry>,
    settings: IndexSettings,
    state: Arc<Mutex<ControllerState>>,
}

#[derive(Default)]
struct ControllerState {
    next_run_id: u64,
    /// Set while a run is active; cleared by stop or task completion
    active: Option<ActiveRun>,
    /// Most recently dispatched task, until joined or replaced
    last_task: Option<RunTask>,
}

struct ActiveRun {
    run_id: u64,
    cancel: CancellationToken,
}

struct RunTask {
    run_id: u64,
    /// Cancelled once the task has fully finished
    finished: CancellationToken,
    handle: Option<JoinHandle<RunSummary>>,
}

/// Clears the active flag when the task ends, however it ends
struct CompletionGuard {
    state: Arc<Mutex<ControllerState>>,
    run_id: u64,
    finished: CancellationToken,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        if state.active.as_ref().map(|run| run.run_id) == Some(self.run_id) {
            state.active = None;
        }
        drop(state);
        self.finished.cancel();
    }
}

fn lock_state(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RunController {
    /// Creates an idle controller
    ///
    /// # Arguments
    ///
    /// * `storage` - Persistence shared with the status reporting side
    /// * `crawler` - Crawl capability used for every site pass
    /// * `registry` - Source of the sites, read at the start of each run
    /// * `settings` - Concurrency and deadline settings for site passes
    pub fn new(
        storage: SharedStorage,
        crawler: Arc<dyn Crawl>,
        registry: Arc<dyn SiteRegistry>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            storage,
            crawler,
            registry,
            settings,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    /// Returns true while a run is active
    pub fn is_running(&self) -> bool {
        lock_state(&self.state).active.is_some()
    }

    pub fn state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Starts an indexing run in the background
    ///
    /// Returns as soon as the task is dispatched.
    ///
    /// # Returns
    ///
    /// * `Ok(run_id)` - The run was accepted
    /// * `Err(RunError::AlreadyRunning)` - A run is active; nothing changed
    /// * `Err(RunError::DispatchError)` - No runtime to spawn on; the run
    ///   state was rolled back to idle
    pub fn start(&self) -> Result<u64, RunError> {
        let (run_id, cancel, finished, previous, runtime) = {
            let mut state = lock_state(&self.state);
            if state.active.is_some() {
                return Err(RunError::AlreadyRunning);
            }

            state.next_run_id += 1;
            let run_id = state.next_run_id;
            let cancel = CancellationToken::new();
            state.active = Some(ActiveRun {
                run_id,
                cancel: cancel.clone(),
            });

            let runtime = match tokio::runtime::Handle::try_current() {
                Ok(runtime) => runtime,
                Err(e) => {
                    state.active = None;
                    tracing::error!("Cannot dispatch indexing run {}: {}", run_id, e);
                    return Err(RunError::DispatchError);
                }
            };

            let finished = CancellationToken::new();
            let previous = state.last_task.replace(RunTask {
                run_id,
                finished: finished.clone(),
                handle: None,
            });

            (run_id, cancel, finished, previous, runtime)
        };

        let guard = CompletionGuard {
            state: self.state.clone(),
            run_id,
            finished,
        };
        let previous_finished = previous.map(|task| task.finished);
        let storage = self.storage.clone();
        let crawler = self.crawler.clone();
        let registry = self.registry.clone();
        let settings = self.settings.clone();

        tracing::info!("Starting indexing run {}", run_id);

        let handle = runtime.spawn(async move {
            let _guard = guard;

            if let Some(previous_finished) = previous_finished {
                previous_finished.cancelled().await;
            }

            let sites = registry.sites();
            run_sites(run_id, &storage, crawler.as_ref(), sites, &cancel, &settings).await
        });

        let mut state = lock_state(&self.state);
        match state.last_task.as_mut() {
            Some(task) if task.run_id == run_id => task.handle = Some(handle),
            _ => drop(handle),
        }

        Ok(run_id)
    }

    /// Signals the active run to stop and marks the controller idle
    ///
    /// The task notices the signal at its next checkpoint. Work already
    /// finished is kept.
    pub fn stop(&self) -> Result<(), RunError> {
        let run = lock_state(&self.state)
            .active
            .take()
            .ok_or(RunError::NotRunning)?;

        tracing::info!("Stopping indexing run {}", run.run_id);
        run.cancel.cancel();
        Ok(())
    }

    /// Waits for the most recently started task to finish
    ///
    /// # Returns
    ///
    /// The run's summary, or `None` if there is no task to wait for or its
    /// result was already taken
    pub async fn join(&self) -> Option<RunSummary> {
        let handle = lock_state(&self.state)
            .last_task
            .as_mut()
            .and_then(|task| task.handle.take())?;

        match handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!("Indexing task ended abnormally: {}", e);
                None
            }
        }
    }

    /// Stops any active run and waits for its task to finish
    pub async fn shutdown(&self) -> Option<RunSummary> {
        if self.stop().is_ok() {
            tracing::info!("Waiting for the indexing task to finish");
        }
        self.join().await
    }
}
