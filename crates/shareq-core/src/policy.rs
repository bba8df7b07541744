use serde::{Deserialize, Serialize};

use crate::{clock::EpochMs, types::ShareRecord, ShareState};

/// Pure purge policy. Stores apply it inside their own critical section;
/// keeping the decisions here makes them testable without a database.
///
/// Defaults:
/// - records expire after 2 days regardless of state
/// - a record that failed more than 500 times is a poison pill and is
///   evicted rather than retried forever (too small a threshold is
///   dangerous: fails build up quickly while the device is offline)
/// - a checkout lease lapses after 15 minutes, after which the recovery
///   sweep hands the record back to the pending pool
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurgePolicy {
    #[serde(default = "default_record_expiry_ms")]
    pub record_expiry_ms: i64,
    #[serde(default = "default_max_fails")]
    pub max_fails: u32,
    #[serde(default = "default_lease_ttl_ms")]
    pub lease_ttl_ms: i64,
}

fn default_record_expiry_ms() -> i64 {
    2 * 24 * 60 * 60 * 1000
}

fn default_max_fails() -> u32 {
    500
}

fn default_lease_ttl_ms() -> i64 {
    15 * 60 * 1000
}

impl Default for PurgePolicy {
    fn default() -> Self {
        Self {
            record_expiry_ms: default_record_expiry_ms(),
            max_fails: default_max_fails(),
            lease_ttl_ms: default_lease_ttl_ms(),
        }
    }
}

impl PurgePolicy {
    /// Records created before this instant have aged out.
    pub fn expiry_cutoff(&self, now: EpochMs) -> EpochMs {
        now - self.record_expiry_ms
    }

    /// True when the record matches any deletion clause: aged out,
    /// terminally processed, or over the fail threshold.
    pub fn should_delete(&self, record: &ShareRecord, now: EpochMs) -> bool {
        record.created_at_ms < self.expiry_cutoff(now)
            || record.state == ShareState::Processed
            || record.fails > self.max_fails
    }

    /// True when the record is stuck in Processing past its lease and
    /// should be handed back to the pending pool.
    pub fn lease_expired(&self, record: &ShareRecord, now: EpochMs) -> bool {
        record.state == ShareState::Processing
            && record.lease_expires_at_ms.map_or(false, |t| t <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Destination, RequestId};

    fn record(created_at_ms: i64, state: ShareState, fails: u32) -> ShareRecord {
        ShareRecord {
            id: RequestId(1),
            file_path: "/tmp/photo.jpg".to_string(),
            destination: Destination::Email,
            created_at_ms,
            state,
            fails,
            lease_expires_at_ms: None,
        }
    }

    #[test]
    fn deletes_aged_out_records_regardless_of_state() {
        let policy = PurgePolicy::default();
        let now = policy.record_expiry_ms + 10;
        for state in [ShareState::Pending, ShareState::Processing] {
            assert!(policy.should_delete(&record(0, state, 0), now));
            assert!(!policy.should_delete(&record(now - 1, state, 0), now));
        }
    }

    #[test]
    fn deletes_processed_records_regardless_of_age() {
        let policy = PurgePolicy::default();
        assert!(policy.should_delete(&record(100, ShareState::Processed, 0), 100));
    }

    #[test]
    fn deletes_only_past_fail_threshold() {
        let policy = PurgePolicy::default();
        assert!(!policy.should_delete(&record(100, ShareState::Pending, 500), 100));
        assert!(policy.should_delete(&record(100, ShareState::Pending, 501), 100));
    }

    #[test]
    fn lease_expiry_only_applies_to_processing() {
        let policy = PurgePolicy::default();
        let mut r = record(0, ShareState::Processing, 0);
        assert!(!policy.lease_expired(&r, 100));
        r.lease_expires_at_ms = Some(100);
        assert!(policy.lease_expired(&r, 100));
        assert!(!policy.lease_expired(&r, 99));
        r.state = ShareState::Pending;
        assert!(!policy.lease_expired(&r, 100));
    }
}
