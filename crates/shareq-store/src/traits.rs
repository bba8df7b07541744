use shareq_core::{Destination, RequestId, ShareRecord, ShareRequest};

/// Single source of truth for pending delivery work.
///
/// Contract notes, relied on by worker retry loops:
/// - no method panics or returns an error to the caller; a storage failure
///   degrades to `false` (or an empty checkout) meaning "nothing changed,
///   try again next cycle"
/// - `checkout` transfers ownership of resolution: the caller must
///   eventually `mark_successful` or `mark_failed` every returned id, or
///   the record stays in Processing until its lease lapses and the purge
///   recovery sweep re-queues it
/// - all mutating calls on one store instance are mutually exclusive
pub trait ShareRequestStore: Send + Sync {
    /// Insert a new pending request. Rejects an empty file path. Duplicate
    /// calls create duplicate records; workers tolerate duplicate artifacts.
    fn create(&self, file_path: &str, destination: Destination) -> bool;

    /// Atomically claim every pending request for the destination, oldest
    /// first. A row claimed by a concurrent caller is skipped, not an error.
    fn checkout(&self, destination: Destination) -> Vec<ShareRequest>;

    /// Transition the request to Processed (terminal). False when the id no
    /// longer exists; callers treat that as nothing-to-do.
    fn mark_successful(&self, id: RequestId) -> bool;

    /// Return the request to Pending and count the failure. False when the
    /// id no longer exists.
    fn mark_failed(&self, id: RequestId) -> bool;

    /// Re-queue Processing rows with lapsed leases, then delete every row
    /// matching the purge policy (aged out, Processed, or over the fail
    /// threshold). Returns the number of rows deleted.
    fn purge(&self) -> usize;

    /// Full dump of the table for diagnostics and tests. Not part of the
    /// worker contract.
    fn snapshot(&self) -> anyhow::Result<Vec<ShareRecord>>;
}
