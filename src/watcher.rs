//! Monitoring a source root for arrivals.
//!
//! Monitoring is split into a producer and a consumer joined by a channel:
//!
//! - the producer is a `notify` subscription registered recursively on the
//!   root; its handler turns create/modify events for non-directory paths
//!   into [`WatchSignal::Changed`] and does nothing else;
//! - the consumer is one worker thread running [`run_debounce_loop`], which
//!   waits for the burst to settle and then runs a scan pass.
//!
//! Manual passes ([`Watcher::scan_once`]) run on the caller's thread and may
//! overlap with a notification-triggered pass. Both tolerate the other
//! moving a file first: the loser sees the entry as vanished.

use crate::config::{CompiledFilters, SorterConfig};
use crate::file_organizer::{OrganizeError, OrganizeResult, SourceRoot};
use crate::scanner::{self, ScanProgress, ScanReport};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Message from the subscription (or the owner) to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    /// Something under the root was created or modified.
    Changed,
    /// Stop waiting; do not start another pass.
    Shutdown,
}

/// Waits for bursts of [`WatchSignal::Changed`] to settle and calls
/// `on_settled` once per burst.
///
/// A burst settles once `debounce` passes without a new signal, or once
/// `max_debounce` has passed since its first signal, whichever is sooner.
/// Returns on [`WatchSignal::Shutdown`] or when every sender is gone; a
/// pending burst is dropped, but a call to `on_settled` already in progress
/// always runs to completion.
pub fn run_debounce_loop<F>(
    signals: &Receiver<WatchSignal>,
    debounce: Duration,
    max_debounce: Duration,
    mut on_settled: F,
) where
    F: FnMut(),
{
    loop {
        match signals.recv() {
            Ok(WatchSignal::Changed) => {}
            Ok(WatchSignal::Shutdown) | Err(_) => return,
        }

        let burst_started = Instant::now();
        loop {
            let elapsed = burst_started.elapsed();
            if elapsed >= max_debounce {
                break;
            }
            let wait = debounce.min(max_debounce - elapsed);
            match signals.recv_timeout(wait) {
                Ok(WatchSignal::Changed) => continue,
                Ok(WatchSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        on_settled();
    }
}

/// Returns true if a notification should schedule a pass.
fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| !path.is_dir())
}

struct Monitor {
    subscription: RecommendedWatcher,
    signals: Sender<WatchSignal>,
    worker: JoinHandle<()>,
}

/// A sorting session bound to one source root.
///
/// The root is fixed for the lifetime of the watcher; sorting a different
/// folder means building a new one. All methods take `&self`, so a watcher
/// can be shared between threads.
pub struct Watcher {
    root: SourceRoot,
    config: SorterConfig,
    filters: CompiledFilters,
    monitor: Mutex<Option<Monitor>>,
}

impl Watcher {
    /// Establishes `path` as the source root (creating its category tree)
    /// and prepares a session in the idle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the root cannot be
    /// established.
    pub fn new(path: impl AsRef<Path>, config: SorterConfig) -> OrganizeResult<Self> {
        config.validate()?;
        let filters = config.filters.clone().compile()?;
        let root = SourceRoot::establish(path)?;
        Ok(Self {
            root,
            config,
            filters,
            monitor: Mutex::new(None),
        })
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    /// Runs one classify-and-move pass on the calling thread.
    pub fn scan_once(&self) -> OrganizeResult<ScanReport> {
        scanner::scan_once(&self.root, &self.filters)
    }

    /// Runs one pass on the calling thread, reporting progress per entry.
    pub fn scan_with_progress<F>(&self, on_progress: F) -> OrganizeResult<ScanReport>
    where
        F: FnMut(ScanProgress),
    {
        scanner::scan_with_progress(&self.root, &self.filters, on_progress)
    }

    /// Subscribes to changes under the root and starts the worker.
    ///
    /// Does nothing if monitoring is already active.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be registered or the
    /// worker cannot be spawned.
    pub fn start_monitoring(&self) -> OrganizeResult<()> {
        self.start_monitoring_with(|_| {})
    }

    /// Like [`Watcher::start_monitoring`], handing every completed
    /// notification-triggered pass to `on_pass` on the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be registered or the
    /// worker cannot be spawned.
    pub fn start_monitoring_with<F>(&self, mut on_pass: F) -> OrganizeResult<()>
    where
        F: FnMut(&ScanReport) + Send + 'static,
    {
        let mut monitor = self.lock_monitor();
        if monitor.is_some() {
            debug!(root = %self.root.path().display(), "already monitoring");
            return Ok(());
        }

        let root_path = self.root.path().to_path_buf();
        let watch_failed = |source: notify::Error| OrganizeError::WatchFailed {
            path: root_path.clone(),
            source,
        };

        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();
        let mut subscription =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event) => {
                    trace!(kind = ?event.kind, paths = ?event.paths, "change notification");
                    // The worker may already be gone during shutdown.
                    let _ = event_tx.send(WatchSignal::Changed);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "watch error"),
            })
            .map_err(watch_failed)?;
        subscription
            .watch(&root_path, RecursiveMode::Recursive)
            .map_err(watch_failed)?;

        let root = self.root.clone();
        let filters = self.filters.clone();
        let debounce = self.config.debounce;
        let max_debounce = self.config.max_debounce;
        let worker = thread::Builder::new()
            .name("filesorter-watch".to_string())
            .spawn(move || {
                run_debounce_loop(&rx, debounce, max_debounce, || {
                    match scanner::scan_once(&root, &filters) {
                        Ok(report) => on_pass(&report),
                        Err(e) => error!(error = %e, "scan pass failed"),
                    }
                });
                debug!("watch worker stopped");
            })
            .map_err(|e| watch_failed(notify::Error::io(e)))?;

        *monitor = Some(Monitor {
            subscription,
            signals: tx,
            worker,
        });
        info!(root = %root_path.display(), "monitoring started");
        Ok(())
    }

    /// Unsubscribes and waits for the worker to exit.
    ///
    /// A pass that is already running finishes first; no pass starts after
    /// this returns. Does nothing if monitoring is not active.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread panicked.
    pub fn stop_monitoring(&self) -> OrganizeResult<()> {
        let mut monitor = self.lock_monitor();
        let Some(Monitor {
            subscription,
            signals,
            worker,
        }) = monitor.take()
        else {
            return Ok(());
        };

        drop(subscription);
        let _ = signals.send(WatchSignal::Shutdown);
        drop(signals);
        worker.join().map_err(|_| OrganizeError::WorkerPanicked)?;

        info!(root = %self.root.path().display(), "monitoring stopped");
        Ok(())
    }

    pub fn is_monitoring(&self) -> bool {
        self.lock_monitor().is_some()
    }

    fn lock_monitor(&self) -> MutexGuard<'_, Option<Monitor>> {
        self.monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop_monitoring() {
            error!(error = %e, "failed to stop monitoring cleanly");
        }
    }
}
