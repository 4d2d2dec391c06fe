//! Fan-out of snapshots to live subscriptions.

use tokio::sync::mpsc;

use crate::backend::Snapshot;
use crate::path::DbPath;

struct Subscriber {
    path: DbPath,
    tx: mpsc::UnboundedSender<Snapshot>,
}

/// Registered subscriptions of one backend.
#[derive(Default)]
pub(crate) struct SubscriberHub {
    subscribers: Vec<Subscriber>,
}

impl SubscriberHub {
    pub(crate) fn register(&mut self, path: DbPath, tx: mpsc::UnboundedSender<Snapshot>) {
        self.subscribers.push(Subscriber { path, tx });
    }

    /// Forget subscriptions whose receiving side has been dropped.
    pub(crate) fn prune(&mut self) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| !s.tx.is_closed());
        before - self.subscribers.len()
    }

    /// Distinct subscribed paths that a write to any of `written` can change.
    pub(crate) fn affected_paths(&self, written: &[DbPath]) -> Vec<DbPath> {
        let mut paths: Vec<DbPath> = self
            .subscribers
            .iter()
            .filter(|s| written.iter().any(|w| w.overlaps(&s.path)))
            .map(|s| s.path.clone())
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Deliver `snapshot` to every subscriber of its path. Returns how many
    /// subscribers received it.
    pub(crate) fn deliver(&self, snapshot: &Snapshot) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.path == snapshot.path)
            .filter(|s| s.tx.send(snapshot.clone()).is_ok())
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
