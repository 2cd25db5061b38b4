//! `MemoryStore` contract: ingest, recall, modify, and the two project-scoped bulk reads used by
//! the search pipeline and exporters.

use crate::error::Result;
use crate::types::{Memory, ModifyAction, NewMemory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of [`MemoryStore::store`].
#[derive(Debug, Clone, Copy)]
pub struct StoreReceipt {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Create a project if missing, embed `content`, insert the row, and publish `memory.created` once
    /// the insert commits. The commit happens-before the event publish.
    async fn store(&self, new_memory: NewMemory) -> Result<StoreReceipt>;

    /// Full rows for the given ids, in no particular order; ids that don't
    /// exist are silently omitted.
    async fn recall(&self, ids: &[i64]) -> Result<Vec<Memory>>;

    /// Apply `action` to `id`, publishing `memory.updated` or
    /// `memory.inactivated` once the update commits.
    async fn modify(&self, id: i64, action: ModifyAction) -> Result<Memory>;

    /// Active rule-type memories visible to `project`: `project`'s own rules plus every rule in
    /// [`cairn_core::types::GLOBAL_PROJECT`].
    async fn get_rules(&self, project: &str) -> Result<Vec<Memory>>;

    /// Every memory in `project`, active or not, for export/backup.
    async fn export_project(&self, project: &str) -> Result<Vec<Memory>>;
}
