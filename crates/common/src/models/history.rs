use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::signal::SignalVector;

/// One classified day as kept by the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: NaiveDate,
    /// Unix milliseconds of the classification.
    pub timestamp: i64,
    #[serde(flatten)]
    pub signals: SignalVector,
    pub scenario_id: u32,
    pub scenario_name: String,
    pub confidence: u8,
}

/// Applies the retention contract to a date-ordered history: an entry for an
/// already recorded date replaces it in place, any other entry is inserted at
/// its date, then the oldest dates are evicted until at most `retention` remain.
pub fn record_entry(history: &mut Vec<HistoryEntry>, entry: HistoryEntry, retention: usize) {
    match history.binary_search_by_key(&entry.date, |existing| existing.date) {
        Ok(index) => history[index] = entry,
        Err(index) => history.insert(index, entry),
    }

    if history.len() > retention {
        let excess = history.len() - retention;
        history.drain(..excess);
    }
}
