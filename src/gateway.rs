// src/gateway.rs
use crate::error::StoreResult;
use crate::models::{RawAttributes, RecordClass, RecordKey};

/// Query and mutation surface of a platform credential store.
///
/// Calls are synchronous and may block. Implementations report store
/// outcomes once and never retry. Callers handle an empty access group
/// before reaching the gateway.
pub trait CredentialStoreGateway {
    /// Every record of either class visible under `access_group`.
    fn query(&self, access_group: &str) -> StoreResult<Vec<(RawAttributes, RecordClass)>>;

    /// Fails with `AlreadyExists` or `Denied`.
    fn insert(&mut self, key: &RecordKey, payload: &[u8]) -> StoreResult<()>;

    /// Fails with `NotFound` or `Denied`.
    fn update(&mut self, key: &RecordKey, new_payload: &[u8]) -> StoreResult<()>;

    /// Fails with `NotFound`.
    fn delete(&mut self, key: &RecordKey) -> StoreResult<()>;
}

/// Matches an access-group label against a pattern. A trailing `*` matches
/// any suffix; anything else must match exactly.
pub fn group_matches(pattern: &str, group: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => group.starts_with(prefix),
        None => pattern == group,
    }
}
