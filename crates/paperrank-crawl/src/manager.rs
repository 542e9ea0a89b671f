//! Crawl manager: claims batches from the frontier and dispatches workers
//!
//! The manager loop runs on one thread of a dedicated rayon pool and the
//! remaining `workers` threads run batches. It never blocks on a worker:
//! it either claims and dispatches, or sleeps on the in-flight counter
//! until a worker finishes or the poll interval passes.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use paperrank_core::{InFlight, ProgressContext, SharedProgress, fmt_num, shutdown_flag};
use paperrank_frontier::{Changeset, Collection, FrontierStore, StoreError};

use crate::config::CrawlConfig;
use crate::source::CitationSource;
use crate::worker::{BatchOutcome, run_batch};

/// Interval between frontier size reports in the log
const REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Manager lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Frontier has work; batches are being claimed
    Running,
    /// Frontier empty; waiting for claims to settle
    Draining,
    /// Frontier exhausted
    Done,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "RUNNING",
            Self::Draining => "DRAINING",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Crawl execution summary
#[derive(Debug)]
pub struct CrawlSummary {
    pub batches_dispatched: usize,
    pub batches_committed: usize,
    pub batches_rolled_back: usize,
    /// Batches whose results could not be committed and went back to `EXPLORE`
    pub batches_released: usize,
    pub pmids_processed: usize,
    pub pmids_unresolved: usize,
    pub final_state: CrawlState,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn log(&self) {
        log::info!("=== Crawl Summary ===");
        log::info!(
            "Batches: {} dispatched, {} committed, {} rolled back, {} released",
            fmt_num(self.batches_dispatched),
            fmt_num(self.batches_committed),
            fmt_num(self.batches_rolled_back),
            fmt_num(self.batches_released)
        );
        log::info!(
            "PMIDs: {} processed, {} unresolved",
            fmt_num(self.pmids_processed),
            fmt_num(self.pmids_unresolved)
        );
        log::info!("State: {}", self.final_state);
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());

        if self.pmids_processed > 0 {
            let rate = self.pmids_processed as f64 / self.elapsed.as_secs_f64();
            log::info!("Throughput: {:.1} PMIDs/sec", rate);
        }
        if self.batches_released > 0 {
            log::warn!(
                "{} batches could not be committed and were requeued",
                self.batches_released
            );
        }
    }
}

#[derive(Default)]
struct Counters {
    dispatched: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    released: AtomicUsize,
    processed: AtomicUsize,
    unresolved: AtomicUsize,
    /// First store failure reported by a worker
    store_error: Mutex<Option<StoreError>>,
}

impl Counters {
    fn record(&self, outcome: &BatchOutcome) {
        match outcome {
            BatchOutcome::Committed {
                processed,
                unresolved,
            } => {
                self.committed.fetch_add(1, Ordering::Relaxed);
                self.processed.fetch_add(*processed, Ordering::Relaxed);
                self.unresolved
                    .fetch_add(unresolved.len(), Ordering::Relaxed);
            }
            BatchOutcome::RolledBack => {
                self.rolled_back.fetch_add(1, Ordering::Relaxed);
            }
            BatchOutcome::Released => {
                self.released.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn record_error(&self, e: StoreError) {
        self.store_error.lock().unwrap().get_or_insert(e);
    }

    fn take_error(&self) -> Option<StoreError> {
        self.store_error.lock().unwrap().take()
    }

    fn status(&self, in_flight: usize) -> String {
        format!(
            "{} batches ({} committed, {} rolled back, {} released), {} in flight, {} PMIDs processed",
            fmt_num(self.dispatched.load(Ordering::Relaxed)),
            fmt_num(self.committed.load(Ordering::Relaxed)),
            fmt_num(self.rolled_back.load(Ordering::Relaxed)),
            fmt_num(self.released.load(Ordering::Relaxed)),
            in_flight,
            fmt_num(self.processed.load(Ordering::Relaxed)),
        )
    }
}

/// Why the dispatch loop ended
enum Exit {
    Exhausted,
    Stopped,
}

/// Drives the crawl until the frontier is exhausted or a stop is requested.
pub struct Manager<'a> {
    store: &'a dyn FrontierStore,
    source: &'a dyn CitationSource,
    config: CrawlConfig,
    in_flight: InFlight,
    stop: &'a AtomicBool,
    progress: SharedProgress,
}

impl<'a> Manager<'a> {
    /// Manager observing the process-wide shutdown flag.
    pub fn new(
        store: &'a dyn FrontierStore,
        source: &'a dyn CitationSource,
        config: CrawlConfig,
    ) -> Self {
        Self {
            store,
            source,
            config,
            in_flight: InFlight::new(),
            stop: shutdown_flag(),
            progress: Arc::new(ProgressContext::hidden()),
        }
    }

    /// Observe `stop` instead of the process-wide shutdown flag.
    pub fn with_stop_flag(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Nothing left to explore, nothing claimed, nothing running here.
    pub fn is_exhausted(&self) -> Result<bool, StoreError> {
        Ok(self.in_flight.count() == 0 && is_frontier_exhausted(self.store)?)
    }

    /// Run the crawl to exhaustion or cancellation.
    ///
    /// Worker failures are absorbed into store transitions and counted in
    /// the summary. Store failures, whether claiming or in a worker that
    /// could not release its batch, stop dispatch and surface as errors
    /// after every dispatched worker has finished.
    pub fn run(&self) -> Result<CrawlSummary> {
        self.config.validate()?;
        let start = Instant::now();

        self.store.ping().context("Frontier store unavailable")?;

        if self.config.recover_claims {
            let moved = recover_claims(self.store).context("Failed to recover stranded claims")?;
            if moved > 0 {
                log::info!("Requeued {} stranded claims", fmt_num(moved));
            }
        }

        log::info!(
            "Crawling with {} workers, batch size {}",
            self.config.workers,
            self.config.batch_size
        );

        // One extra thread hosts the dispatch loop itself
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers + 1)
            .thread_name(|i| format!("crawl-{i}"))
            .build()
            .context("Failed to create thread pool")?;

        let counters = Counters::default();
        let pb = self.progress.status_line("crawl");
        let result = pool.scope(|scope| self.dispatch_loop(scope, &counters, &pb));
        pb.finish_and_clear();

        let (exit, state) = result.context("Frontier store failed during crawl")?;
        if let Some(e) = counters.take_error() {
            return Err(e).context("Frontier store failed during crawl, run `paperrank recover`");
        }
        let cancelled = matches!(exit, Exit::Stopped);
        let final_state = match exit {
            Exit::Exhausted => CrawlState::Done,
            Exit::Stopped => match self.is_exhausted() {
                Ok(true) => CrawlState::Done,
                Ok(false) => state,
                Err(e) => {
                    log::warn!("Cannot check frontier after stop: {e}");
                    state
                }
            },
        };

        let summary = CrawlSummary {
            batches_dispatched: counters.dispatched.load(Ordering::Relaxed),
            batches_committed: counters.committed.load(Ordering::Relaxed),
            batches_rolled_back: counters.rolled_back.load(Ordering::Relaxed),
            batches_released: counters.released.load(Ordering::Relaxed),
            pmids_processed: counters.processed.load(Ordering::Relaxed),
            pmids_unresolved: counters.unresolved.load(Ordering::Relaxed),
            final_state,
            cancelled,
            elapsed: start.elapsed(),
        };
        summary.log();
        Ok(summary)
    }

    fn dispatch_loop<'s>(
        &'s self,
        scope: &rayon::Scope<'s>,
        counters: &'s Counters,
        pb: &ProgressBar,
    ) -> Result<(Exit, CrawlState), StoreError> {
        let mut state = CrawlState::Running;
        let mut last_report = Instant::now();

        loop {
            if let Some(e) = counters.take_error() {
                return Err(e);
            }
            if self.stop.load(Ordering::Relaxed) {
                let pending = self.in_flight.count();
                if pending > 0 {
                    log::warn!("Stop requested, waiting for {pending} in-flight batches");
                }
                return Ok((Exit::Stopped, state));
            }

            if let Some(slot) = self.in_flight.try_acquire(self.config.workers) {
                let batch = self.store.claim_into(
                    Collection::Explore,
                    Collection::Instance,
                    self.config.batch_size,
                )?;

                if !batch.is_empty() {
                    if state != CrawlState::Running {
                        log::debug!("Frontier refilled, resuming");
                        state = CrawlState::Running;
                    }
                    counters.dispatched.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Dispatching batch of {} PMIDs", batch.len());

                    let store = self.store;
                    let source = self.source;
                    let retries = self.config.commit_retries;
                    scope.spawn(move |_| {
                        let _slot = slot;
                        match run_batch(&batch, store, source, retries) {
                            Ok(outcome) => counters.record(&outcome),
                            Err(e) => counters.record_error(e),
                        }
                    });

                    pb.set_message(counters.status(self.in_flight.count()));
                    if !self.config.stagger.is_zero() {
                        std::thread::sleep(self.config.stagger);
                    }
                    continue;
                }

                drop(slot);
                if state == CrawlState::Running {
                    log::debug!("Frontier empty, draining");
                    state = CrawlState::Draining;
                }
            }

            let observed = self.in_flight.count();
            if observed == 0 && is_frontier_exhausted(self.store)? {
                return Ok((Exit::Exhausted, CrawlState::Done));
            }

            if last_report.elapsed() >= REPORT_INTERVAL {
                self.report(observed)?;
                last_report = Instant::now();
            }
            pb.set_message(counters.status(observed));
            self.in_flight.wait_change(observed, self.config.poll_interval);
        }
    }

    fn report(&self, in_flight: usize) -> Result<(), StoreError> {
        let explore = self.store.size(Collection::Explore)?;
        let claimed = self.store.size(Collection::Instance)?;
        let seen = self.store.size(Collection::Seen)?;
        log::info!(
            "Frontier: {} to explore, {} claimed, {} seen ({} batches in flight)",
            fmt_num(explore),
            fmt_num(claimed),
            fmt_num(seen),
            in_flight
        );
        if in_flight == 0 && explore == 0 && claimed > 0 {
            log::warn!(
                "Waiting on {claimed} claims held outside this process; \
                 run `paperrank recover` if they are stranded"
            );
        }
        Ok(())
    }
}

/// `EXPLORE` and `INSTANCE` are both empty.
pub fn is_frontier_exhausted(store: &dyn FrontierStore) -> Result<bool, StoreError> {
    Ok(store.is_empty(Collection::Explore)? && store.is_empty(Collection::Instance)?)
}

/// Admit seed PMIDs to `EXPLORE`; already-seen ones are filtered out.
pub fn seed(store: &dyn FrontierStore, pmids: &[String]) -> Result<(), StoreError> {
    let mut changes = Changeset::new();
    changes
        .add(
            Collection::Explore,
            pmids
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty()),
        )
        .subtract(Collection::Explore, Collection::Seen);
    store.apply(&changes)
}

/// Move every claim in `INSTANCE` back to `EXPLORE`.
///
/// Only safe when no other crawler is running against the same store:
/// live claims would be processed twice (harmless, but wasted requests).
/// Returns the number of claims moved.
pub fn recover_claims(store: &dyn FrontierStore) -> Result<usize, StoreError> {
    let stranded = store.size(Collection::Instance)?;
    if stranded == 0 {
        return Ok(0);
    }
    let mut changes = Changeset::new();
    changes
        .move_all(Collection::Instance, Collection::Explore)
        .subtract(Collection::Explore, Collection::Seen);
    store.apply(&changes)?;
    Ok(stranded)
}
