use async_trait::async_trait;
use common::models::{HistoryEntry, record_entry};
use common::traits::HistoryStore;
use tokio::sync::Mutex;

/// Process-local history with the same replace and retention rules as the
/// SQLite repository. Nothing survives a restart.
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
    retention: usize,
}

impl MemoryHistoryStore {
    pub fn new(retention: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            retention,
        }
    }

    pub fn with_entries(entries: Vec<HistoryEntry>, retention: usize) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            record_entry(&mut kept, entry, retention);
        }
        Self {
            entries: Mutex::new(kept),
            retention,
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn record(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        record_entry(&mut entries, entry.clone(), self.retention);
        Ok(())
    }

    async fn load_recent(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        let entries = self.entries.lock().await;
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
