use std::sync::{Arc, Mutex};

use shareq_core::{
    Clock, Destination, PurgePolicy, RequestId, ShareRecord, ShareRequest, ShareState,
    SystemClock,
};
use tracing::{debug, warn};

use crate::traits::ShareRequestStore;

/// In-memory store for tests. Not durable, but implements the same
/// transition semantics as the SQLite backend.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    policy: PurgePolicy,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: Vec<ShareRecord>,
}

impl InMemoryStore {
    pub fn new(policy: PurgePolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: PurgePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                rows: Vec::new(),
            }),
            policy,
            clock,
        }
    }
}

impl ShareRequestStore for InMemoryStore {
    fn create(&self, file_path: &str, destination: Destination) -> bool {
        if file_path.is_empty() {
            warn!("create rejected: empty file path");
            return false;
        }
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.rows.push(ShareRecord {
            id: RequestId(id),
            file_path: file_path.to_string(),
            destination,
            created_at_ms: self.clock.now_ms(),
            state: ShareState::Pending,
            fails: 0,
            lease_expires_at_ms: None,
        });
        debug!(id, file_path, ?destination, "create");
        true
    }

    fn checkout(&self, destination: Destination) -> Vec<ShareRequest> {
        let mut inner = self.inner.lock().unwrap();
        let lease = self.clock.now_ms() + self.policy.lease_ttl_ms;

        let mut claimed: Vec<&mut ShareRecord> = inner
            .rows
            .iter_mut()
            .filter(|r| r.destination == destination && r.state == ShareState::Pending)
            .collect();
        claimed.sort_by_key(|r| r.created_at_ms);

        claimed
            .into_iter()
            .map(|r| {
                r.state = ShareState::Processing;
                r.lease_expires_at_ms = Some(lease);
                debug!(id = r.id.0, file_path = %r.file_path, ?destination, "checkout");
                ShareRequest {
                    id: r.id,
                    file_path: r.file_path.clone(),
                    destination,
                }
            })
            .collect()
    }

    fn mark_successful(&self, id: RequestId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.rows.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.state = ShareState::Processed;
                r.lease_expires_at_ms = None;
                debug!(id = id.0, "mark_successful");
                true
            }
            None => false,
        }
    }

    fn mark_failed(&self, id: RequestId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.rows.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.state = ShareState::Pending;
                r.fails += 1;
                r.lease_expires_at_ms = None;
                debug!(id = id.0, fails = r.fails, "mark_failed");
                true
            }
            None => false,
        }
    }

    fn purge(&self) -> usize {
        let mut inner = self.inner.lock().unwrap();
        let now = self.clock.now_ms();

        let mut recovered = 0usize;
        for r in inner.rows.iter_mut() {
            if self.policy.lease_expired(r, now) {
                r.state = ShareState::Pending;
                r.lease_expires_at_ms = None;
                recovered += 1;
            }
        }
        if recovered > 0 {
            warn!(recovered, "purge re-queued rows with lapsed leases");
        }

        let before = inner.rows.len();
        let policy = &self.policy;
        inner.rows.retain(|r| !policy.should_delete(r, now));
        let deleted = before - inner.rows.len();
        debug!(deleted, "purge");
        deleted
    }

    fn snapshot(&self) -> anyhow::Result<Vec<ShareRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shareq_core::ManualClock;

    fn store() -> (InMemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = InMemoryStore::with_clock(PurgePolicy::default(), clock.clone());
        (store, clock)
    }

    #[test]
    fn create_then_checkout() {
        let (store, _clock) = store();
        assert!(store.create("/tmp/a.jpg", Destination::Email));

        let claimed = store.checkout(Destination::Email);
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].file_path, "/tmp/a.jpg");

        // Now in Processing: a second checkout sees nothing.
        assert!(store.checkout(Destination::Email).is_empty());
    }

    #[test]
    fn create_rejects_empty_path() {
        let (store, _clock) = store();
        assert!(!store.create("", Destination::Email));
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn mark_failed_requeues() {
        let (store, _clock) = store();
        store.create("/tmp/a.jpg", Destination::Dropbox);
        let id = store.checkout(Destination::Dropbox)[0].id;

        assert!(store.mark_failed(id));
        let rows = store.snapshot().unwrap();
        assert_eq!(rows[0].state, ShareState::Pending);
        assert_eq!(rows[0].fails, 1);
        assert_eq!(store.checkout(Destination::Dropbox).len(), 1);
    }

    #[test]
    fn mark_on_missing_id_is_noop() {
        let (store, _clock) = store();
        assert!(!store.mark_successful(RequestId(99)));
        assert!(!store.mark_failed(RequestId(99)));
    }

    #[test]
    fn purge_deletes_processed_and_recovers_lapsed_leases() {
        let (store, clock) = store();
        store.create("/tmp/a.jpg", Destination::Email);
        store.create("/tmp/b.jpg", Destination::Email);
        let claimed = store.checkout(Destination::Email);

        store.mark_successful(claimed[0].id);
        // Leave claimed[1] stranded past its lease.
        clock.advance(PurgePolicy::default().lease_ttl_ms + 1);

        assert_eq!(store.purge(), 1);
        let rows = store.snapshot().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, claimed[1].id);
        assert_eq!(rows[0].state, ShareState::Pending);
        assert_eq!(rows[0].fails, 0);
    }
}
