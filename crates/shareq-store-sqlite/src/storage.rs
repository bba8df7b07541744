use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::{debug, warn};

use shareq_core::{
    Clock, Destination, PurgePolicy, RequestId, ShareRecord, ShareRequest, ShareState,
    SystemClock,
};
use shareq_store::{ShareRequestStore, StoreConfig};

/// SQLite-backed share-request store. The connection mutex gives every
/// operation its own critical section; delivery work happens entirely
/// outside the store, so no caller ever waits on another destination's
/// upload.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    policy: PurgePolicy,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    pub fn open(db_path: &Path, policy: PurgePolicy) -> Result<Self> {
        Self::open_with_clock(db_path, policy, Arc::new(SystemClock))
    }

    /// Open under a data root using a loaded (or default) config.
    pub fn open_config(root: &Path, cfg: &StoreConfig) -> Result<Self> {
        Self::open(&cfg.db_path(root), cfg.purge.clone())
    }

    pub fn open_with_clock(
        db_path: &Path,
        policy: PurgePolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open sqlite db {}", db_path.display()))?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql)?;
        Ok(Self {
            conn: Mutex::new(conn),
            policy,
            clock,
        })
    }

    fn try_create(&self, file_path: &str, destination: Destination) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO shares(file_path, destination, created_at, state, fails)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![
                file_path,
                destination.to_i64(),
                self.clock.now_ms(),
                ShareState::Pending.to_i64()
            ],
        )?;
        Ok(())
    }

    fn try_checkout(&self, destination: Destination) -> Result<Vec<ShareRequest>> {
        let conn = self.conn.lock().unwrap();
        let lease = self.clock.now_ms() + self.policy.lease_ttl_ms;

        let tx = conn.unchecked_transaction()?;

        let candidates: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(
                "SELECT id, file_path FROM shares
                 WHERE destination=?1 AND state=?2
                 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(
                params![destination.to_i64(), ShareState::Pending.to_i64()],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            let mut v = vec![];
            for row in rows {
                v.push(row?);
            }
            v
        };

        // Claim each candidate with a conditional update. A row that was
        // concurrently claimed or mutated matches zero rows and is skipped.
        let mut claimed = Vec::with_capacity(candidates.len());
        for (id, file_path) in candidates {
            let n = tx.execute(
                "UPDATE shares SET state=?1, lease_expires_at=?2 WHERE id=?3 AND state=?4",
                params![
                    ShareState::Processing.to_i64(),
                    lease,
                    id,
                    ShareState::Pending.to_i64()
                ],
            )?;
            if n > 0 {
                debug!(id, file_path = %file_path, ?destination, "checkout");
                claimed.push(ShareRequest {
                    id: RequestId(id),
                    file_path,
                    destination,
                });
            }
        }

        tx.commit()?;
        Ok(claimed)
    }

    fn try_mark_successful(&self, id: RequestId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE shares SET state=?1, lease_expires_at=NULL WHERE id=?2",
            params![ShareState::Processed.to_i64(), id.0],
        )?;
        Ok(n > 0)
    }

    fn try_mark_failed(&self, id: RequestId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE shares SET state=?1, fails=fails+1, lease_expires_at=NULL WHERE id=?2",
            params![ShareState::Pending.to_i64(), id.0],
        )?;
        Ok(n > 0)
    }

    fn try_purge(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let now = self.clock.now_ms();

        let tx = conn.unchecked_transaction()?;

        // Recovery sweep: hand stranded Processing rows back to the
        // pending pool instead of letting them sit until they age out.
        // Fails are untouched; the attempt never resolved.
        let recovered = tx.execute(
            "UPDATE shares SET state=?1, lease_expires_at=NULL
             WHERE state=?2 AND lease_expires_at IS NOT NULL AND lease_expires_at<=?3",
            params![
                ShareState::Pending.to_i64(),
                ShareState::Processing.to_i64(),
                now
            ],
        )?;
        if recovered > 0 {
            warn!(recovered, "purge re-queued rows with lapsed leases");
        }

        let deleted = tx.execute(
            "DELETE FROM shares WHERE created_at<?1 OR state=?2 OR fails>?3",
            params![
                self.policy.expiry_cutoff(now),
                ShareState::Processed.to_i64(),
                self.policy.max_fails
            ],
        )?;

        tx.commit()?;
        debug!(deleted, "purge");
        Ok(deleted)
    }

    fn try_snapshot(&self) -> Result<Vec<ShareRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, file_path, destination, created_at, state, fails, lease_expires_at
             FROM shares ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, i64>(5)?,
                r.get::<_, Option<i64>>(6)?,
            ))
        })?;

        let mut records = vec![];
        for row in rows {
            let (id, file_path, destination, created_at, state, fails, lease) = row?;
            records.push(ShareRecord {
                id: RequestId(id),
                file_path,
                destination: Destination::from_i64(destination)?,
                created_at_ms: created_at,
                state: ShareState::from_i64(state)?,
                fails: fails as u32,
                lease_expires_at_ms: lease,
            });
        }
        Ok(records)
    }
}

impl ShareRequestStore for SqliteStore {
    fn create(&self, file_path: &str, destination: Destination) -> bool {
        if file_path.is_empty() {
            warn!("create rejected: empty file path");
            return false;
        }
        match self.try_create(file_path, destination) {
            Ok(()) => {
                debug!(file_path, ?destination, "create");
                true
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                false
            }
        }
    }

    fn checkout(&self, destination: Destination) -> Vec<ShareRequest> {
        match self.try_checkout(destination) {
            Ok(claimed) => claimed,
            Err(e) => {
                warn!(error = %e, ?destination, "checkout failed");
                vec![]
            }
        }
    }

    fn mark_successful(&self, id: RequestId) -> bool {
        match self.try_mark_successful(id) {
            Ok(found) => {
                debug!(id = id.0, found, "mark_successful");
                found
            }
            Err(e) => {
                warn!(error = %e, id = id.0, "mark_successful failed");
                false
            }
        }
    }

    fn mark_failed(&self, id: RequestId) -> bool {
        match self.try_mark_failed(id) {
            Ok(found) => {
                debug!(id = id.0, found, "mark_failed");
                found
            }
            Err(e) => {
                warn!(error = %e, id = id.0, "mark_failed failed");
                false
            }
        }
    }

    fn purge(&self) -> usize {
        match self.try_purge() {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(error = %e, "purge failed");
                0
            }
        }
    }

    fn snapshot(&self) -> Result<Vec<ShareRecord>> {
        self.try_snapshot()
    }
}
