use crate::{clock::EpochMs, ids::RequestId, model::*};

/// Worker-facing view of a checked-out share. Deliberately excludes state
/// and fail bookkeeping: workers resolve by id, nothing else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareRequest {
    pub id: RequestId,
    pub file_path: String,
    pub destination: Destination,
}

/// Full persisted row, as seen by the store itself and by diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareRecord {
    pub id: RequestId,
    pub file_path: String,
    pub destination: Destination,
    pub created_at_ms: EpochMs,
    pub state: ShareState,
    pub fails: u32,
    /// Set at checkout; a Processing row whose lease has lapsed is
    /// re-queued by the purge recovery sweep.
    pub lease_expires_at_ms: Option<EpochMs>,
}
