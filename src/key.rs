//! Store keys - logical names of synchronized collections.
//!
//! A key identifies one named value ("primal-events", "primal-homework").
//! It selects both the local cache slot and the last segment of the remote
//! document path, so it must be a single path segment.

use crate::error::{Result, SyncError};

/// Maximum key length in bytes.
pub const MAX_KEY_LENGTH: usize = 256;

/// Calendar events collection.
pub const KEY_EVENTS: &str = "primal-events";
/// Homework tracker collection.
pub const KEY_HOMEWORK: &str = "primal-homework";
/// Work planner collection.
pub const KEY_WORK: &str = "primal-work";
/// Ideas / notes collection.
pub const KEY_IDEAS: &str = "primal-ideas";

/// Validate that a key is well-formed.
///
/// Keys become one segment of the remote path `users/{id}/data/{key}`,
/// so they may not contain `/`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SyncError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(SyncError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if key.contains('/') {
        return Err(SyncError::InvalidKey(
            "key may not contain '/'".to_string(),
        ));
    }
    Ok(())
}
