use async_trait::async_trait;

use crate::models::HistoryEntry;

/// Persistence collaborator for classified days.
///
/// Implementations keep at most one entry per date and evict the oldest
/// entries beyond their retention cap.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Inserts the entry, replacing any entry with the same date.
    async fn record(&self, entry: &HistoryEntry) -> anyhow::Result<()>;

    /// Up to `limit` most recent entries, oldest first.
    async fn load_recent(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>>;

    async fn clear(&self) -> anyhow::Result<()>;
}
