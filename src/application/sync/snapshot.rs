//! Last-fetch-wins view state guarded by an epoch counter

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// The most recently fetched value for one view.
///
/// Each poller works under the epoch current when it started. Entering a
/// new view or tearing one down advances the epoch, after which results
/// from the older epoch are refused.
pub struct Snapshot<T> {
    epoch: Mutex<u64>,
    tx: watch::Sender<Option<Arc<T>>>,
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            epoch: Mutex::new(0),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        // The guarded value is a plain counter, a poisoned lock still holds a valid one
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn epoch(&self) -> u64 {
        *self.lock()
    }

    /// Start a new epoch and clear the value left by the previous one.
    pub fn begin(&self) -> u64 {
        let mut epoch = self.lock();
        *epoch += 1;
        self.tx.send_replace(None);
        *epoch
    }

    /// End `epoch` if it is still current. Returns false if a newer epoch
    /// already replaced it, in which case nothing changes.
    pub fn retire(&self, epoch: u64) -> bool {
        let mut current = self.lock();
        if *current != epoch {
            return false;
        }
        *current += 1;
        true
    }

    /// Replace the value if `epoch` is still current, else drop it.
    pub fn publish(&self, epoch: u64, value: T) -> bool {
        let current = self.lock();
        if *current != epoch {
            return false;
        }
        self.tx.send_replace(Some(Arc::new(value)));
        true
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every accepted publish
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<T>>> {
        self.tx.subscribe()
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_replaces() {
        let snapshot = Snapshot::new();
        let epoch = snapshot.begin();

        assert!(snapshot.publish(epoch, vec![1, 2]));
        assert!(snapshot.publish(epoch, vec![3]));
        assert_eq!(*snapshot.current().unwrap(), vec![3]);
    }

    #[test]
    fn test_stale_epoch_is_dropped() {
        let snapshot = Snapshot::new();
        let old = snapshot.begin();
        assert!(snapshot.publish(old, "old view"));

        let new = snapshot.begin();
        assert!(snapshot.current().is_none());
        assert!(!snapshot.publish(old, "late result"));
        assert!(snapshot.current().is_none());
        assert!(snapshot.publish(new, "new view"));
        assert_eq!(*snapshot.current().unwrap(), "new view");
    }

    #[test]
    fn test_retire_only_current() {
        let snapshot: Snapshot<u8> = Snapshot::new();
        let first = snapshot.begin();
        let second = snapshot.begin();

        assert!(!snapshot.retire(first));
        assert_eq!(snapshot.epoch(), second);
        assert!(snapshot.retire(second));
        assert!(!snapshot.publish(second, 1));
    }
}
