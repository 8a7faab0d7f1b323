//! Long-term memory records scoped to a user identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single remembered snippet about a user.
///
/// Owned by the memory store; the relay only creates them and reads
/// their content back from a single recall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// `{user_id}_{8 hex chars}`.
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Build a new record for `user_id` with a freshly generated id.
    pub fn new(user_id: &str, content: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{user_id}_{}", &suffix[..8]),
            user_id: user_id.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}
