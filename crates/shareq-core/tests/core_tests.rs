use shareq_core::{
    Destination, PurgePolicy, RequestId, ShareRecord, ShareRequest, ShareState,
};

#[test]
fn test_share_request_creation() {
    let request = ShareRequest {
        id: RequestId(7),
        file_path: "/data/photos/strip.jpg".to_string(),
        destination: Destination::Facebook,
    };
    assert_eq!(request.id.as_i64(), 7);
    assert_eq!(request.destination, Destination::Facebook);
}

#[test]
fn test_share_record_creation() {
    let record = ShareRecord {
        id: RequestId(1),
        file_path: "/data/photos/strip.jpg".to_string(),
        destination: Destination::Dropbox,
        created_at_ms: 12345,
        state: ShareState::Pending,
        fails: 0,
        lease_expires_at_ms: None,
    };
    assert_eq!(record.state, ShareState::Pending);
    assert_eq!(record.fails, 0);
}

#[test]
fn test_state_enum() {
    assert_eq!(ShareState::Pending, ShareState::Pending);
    assert_ne!(ShareState::Pending, ShareState::Processed);
}

#[test]
fn test_default_policy_values() {
    let policy = PurgePolicy::default();
    assert_eq!(policy.record_expiry_ms, 172_800_000);
    assert_eq!(policy.max_fails, 500);
    assert_eq!(policy.lease_ttl_ms, 900_000);
}

#[test]
fn test_request_id_display() {
    assert_eq!(RequestId(42).to_string(), "42");
}
