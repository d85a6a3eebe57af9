//! Fixed-interval poll loop

use super::{Pipeline, Snapshot, SnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Drives the pipeline on a fixed interval
///
/// Cycles run one at a time: a cycle that outlasts the interval delays the
/// next tick rather than overlapping it.
pub struct Poller {
    pipeline: Arc<Pipeline>,
    store: Arc<SnapshotStore>,
    interval: Duration,
    max_cycles: Option<u64>,
}

/// Shortest interval the loop will tick at
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

impl Poller {
    /// Intervals shorter than [`MIN_INTERVAL`] are raised to it
    pub fn new(pipeline: Arc<Pipeline>, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            tracing::warn!(?interval, "Poll interval too short, using 1s");
        }
        Self {
            pipeline,
            store,
            interval: interval.max(MIN_INTERVAL),
            max_cycles: None,
        }
    }

    /// Stop after `cycles` completed cycles
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Spawn the loop; every published snapshot is forwarded on the returned channel
    pub fn spawn(
        self,
        shutdown: watch::Receiver<bool>,
    ) -> (JoinHandle<()>, mpsc::Receiver<Arc<Snapshot>>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            self.run(shutdown, tx).await;
        });
        (handle, rx)
    }

    /// Poll until shutdown, the cycle limit, or the receiver going away
    pub async fn run(self, mut shutdown: watch::Receiver<bool>, tx: mpsc::Sender<Arc<Snapshot>>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0u64;

        tracing::info!(interval_secs = self.interval.as_secs(), "Poller started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!(completed, "Poller shutting down");
                        return;
                    }
                }

                _ = interval.tick() => {
                    let previous = self.store.current().await;
                    let snapshot = self.pipeline.cycle(&*previous).await;

                    if self.store.publish(snapshot).await {
                        let published = self.store.current().await;
                        if tx.send(published).await.is_err() {
                            tracing::warn!("Snapshot receiver dropped");
                            return;
                        }
                    }

                    completed += 1;
                    if self.max_cycles.is_some_and(|max| completed >= max) {
                        tracing::info!(completed, "Cycle limit reached");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feed::OfflineTransport;

    fn poller_every(interval: Duration) -> (Poller, Arc<SnapshotStore>) {
        let pipeline = Arc::new(Pipeline::new(&Config::default(), Arc::new(OfflineTransport)));
        let store = Arc::new(SnapshotStore::new(pipeline.bootstrap()));
        let poller = Poller::new(pipeline, store.clone(), interval);
        (poller, store)
    }

    fn poller() -> (Poller, Arc<SnapshotStore>) {
        poller_every(Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_after_max_cycles() {
        let (poller, store) = poller();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, mut rx) = poller.with_max_cycles(3).spawn(shutdown_rx);

        let mut cycles = Vec::new();
        while let Some(snapshot) = rx.recv().await {
            cycles.push(snapshot.cycle);
        }
        handle.await.unwrap();

        assert_eq!(cycles, vec![1, 2, 3]);
        assert_eq!(store.current().await.cycle, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_shutdown() {
        let (poller, _store) = poller();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, mut rx) = poller.spawn(shutdown_rx);

        // first tick fires immediately
        let first = rx.recv().await.unwrap();
        assert_eq!(first.cycle, 1);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised() {
        let (poller, store) = poller_every(Duration::ZERO);
        assert_eq!(poller.interval, MIN_INTERVAL);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, mut rx) = poller.with_max_cycles(2).spawn(shutdown_rx);
        while rx.recv().await.is_some() {}
        handle.await.unwrap();

        assert_eq!(store.current().await.cycle, 2);
    }
}
