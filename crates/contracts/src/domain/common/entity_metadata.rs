use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle data the backend keeps for every stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-deleted rows stay in the table but are hidden from lists
    #[serde(default)]
    pub is_deleted: bool,
    /// Bumped on every write
    #[serde(default)]
    pub version: i32,
}

impl EntityMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            is_deleted: false,
            version: 0,
        }
    }

    /// Record a write: refresh `updated_at` and bump the version.
    pub fn revise(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.revise();
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}
