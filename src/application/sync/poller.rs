//! Interval-driven refresh of a displayed view

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::snapshot::Snapshot;
use crate::application::errors::StoreError;
use crate::infrastructure::config::PollingConfig;

/// Reference refresh period of a displayed conversation
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// `tokio::time::interval` rejects a zero period
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Give up on a single fetch after this long; the next tick retries
    pub fetch_timeout: Option<Duration>,
}

impl PollerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            fetch_timeout: None,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl From<&PollingConfig> for PollerConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// Counters kept by a running poller
#[derive(Debug, Default)]
pub struct PollStats {
    fetches: AtomicU64,
    failures: AtomicU64,
    discarded: AtomicU64,
}

impl PollStats {
    /// Fetches started
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Fetches that errored or timed out
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Successful fetches dropped because their epoch had ended
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::SeqCst)
    }
}

/// Background task that keeps a [`Snapshot`] fresh.
///
/// Fetches immediately, then once per interval. Fetches are awaited inline
/// so at most one is in flight; ticks that come due meanwhile are skipped.
/// Dropping the poller aborts the task, [`teardown`](Self::teardown) stops
/// it and waits.
pub struct ConversationPoller<T> {
    epoch: u64,
    snapshot: Arc<Snapshot<T>>,
    refresh: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    stats: Arc<PollStats>,
    task: Option<JoinHandle<()>>,
}

impl<T> ConversationPoller<T>
where
    T: Send + Sync + 'static,
{
    /// Begin a new epoch on `snapshot` and start polling `fetch` into it.
    pub fn spawn<F, Fut>(config: PollerConfig, snapshot: Arc<Snapshot<T>>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        let epoch = snapshot.begin();
        let refresh = Arc::new(Notify::new());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(PollStats::default());

        let task = tokio::spawn(run(
            epoch,
            config,
            snapshot.clone(),
            refresh.clone(),
            shutdown_rx,
            stats.clone(),
            fetch,
        ));
        tracing::debug!("Poller started (epoch {}, every {:?})", epoch, config.interval);

        Self {
            epoch,
            snapshot,
            refresh,
            shutdown,
            stats,
            task: Some(task),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn snapshot(&self) -> &Arc<Snapshot<T>> {
        &self.snapshot
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// Fetch once more as soon as the current fetch, if any, completes.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Stop polling. No fetch starts after this returns and any result
    /// still in flight is discarded.
    pub async fn teardown(mut self) {
        self.snapshot.retire(self.epoch);
        let _ = self.shutdown.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!("Poller task ended abnormally: {}", e);
                }
            }
        }
        tracing::debug!("Poller stopped (epoch {})", self.epoch);
    }
}

impl<T> Drop for ConversationPoller<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.snapshot.retire(self.epoch);
            task.abort();
        }
    }
}

async fn run<T, F, Fut>(
    epoch: u64,
    config: PollerConfig,
    snapshot: Arc<Snapshot<T>>,
    refresh: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<PollStats>,
    fetch: F,
) where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut ticker = tokio::time::interval(config.interval.max(MIN_POLL_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {
                tracing::debug!("Out-of-band refresh (epoch {})", epoch);
            }
        }

        if snapshot.epoch() != epoch {
            break;
        }

        stats.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            outcome = fetch_once(&fetch, config.fetch_timeout) => outcome,
        };

        match outcome {
            Ok(value) => {
                if !snapshot.publish(epoch, value) {
                    stats.discarded.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!("Discarded result from ended epoch {}", epoch);
                    break;
                }
            }
            Err(e) => {
                // Keep the last snapshot, the next tick is the retry
                stats.failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!("Fetch failed (epoch {}): {}", epoch, e);
            }
        }
    }
}

async fn fetch_once<T, F, Fut>(fetch: &F, timeout: Option<Duration>) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fetch())
            .await
            .map_err(|_| StoreError::Unavailable(format!("fetch timed out after {:?}", limit)))?,
        None => fetch().await,
    }
}
