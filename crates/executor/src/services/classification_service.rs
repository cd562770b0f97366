use chrono::{NaiveDate, Utc};
use common::models::{HistoryEntry, SignalVector, record_entry};
use common::traits::HistoryStore;
use std::sync::Arc;
use strategy::services::{Matcher, RegimeAnalyzer};
use tracing::{debug, info};

use crate::services::report::DailyReport;

/// Runs one day through the matcher, the history store and the analyzer.
pub struct ClassificationService {
    matcher: Matcher,
    analyzer: RegimeAnalyzer,
    store: Arc<dyn HistoryStore>,
    retention: usize,
}

impl ClassificationService {
    pub fn new(
        matcher: Matcher,
        analyzer: RegimeAnalyzer,
        store: Arc<dyn HistoryStore>,
        retention: usize,
    ) -> Self {
        Self {
            matcher,
            analyzer,
            store,
            retention,
        }
    }

    /// Classifies `signals` for `date`. With `persist` the result is recorded
    /// first. Either way the context is built from the entries dated before
    /// `date` followed by this day's result, so the day counts toward its own
    /// streak and later days never leak into it.
    pub async fn classify_day(
        &self,
        date: NaiveDate,
        signals: SignalVector,
        persist: bool,
    ) -> anyhow::Result<DailyReport> {
        let result = self.matcher.classify(&signals)?;
        let best = &result.best_match;
        info!(
            "{}: Scenario {} {} ({}%)",
            date, best.scenario.id, best.scenario.name, best.percentage
        );

        let entry = HistoryEntry {
            date,
            timestamp: Utc::now().timestamp_millis(),
            signals,
            scenario_id: best.scenario.id,
            scenario_name: best.scenario.name.clone(),
            confidence: best.percentage,
        };
        if persist {
            self.store.record(&entry).await?;
            debug!("Recorded history entry for {}", date);
        }

        let history = self.store.load_recent(self.retention).await?;
        let timeline = timeline_through(history, entry, self.retention);
        let context = self.analyzer.compute_context(&timeline, best.scenario.id);

        Ok(DailyReport {
            date,
            signals,
            result,
            context,
        })
    }

    /// Re-runs the stored signals for `date` without recording anything.
    pub async fn replay_day(&self, date: NaiveDate) -> anyhow::Result<Option<DailyReport>> {
        let history = self.store.load_recent(self.retention).await?;
        let Some(entry) = history.iter().find(|entry| entry.date == date) else {
            return Ok(None);
        };
        let report = self.classify_day(date, entry.signals, false).await?;
        Ok(Some(report))
    }

    pub async fn history(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        self.store.load_recent(self.retention).await
    }

    pub async fn clear_history(&self) -> anyhow::Result<()> {
        self.store.clear().await?;
        info!("History cleared");
        Ok(())
    }
}

/// Entries strictly before `day`, in date order, with `day` appended last.
fn timeline_through(
    mut history: Vec<HistoryEntry>,
    day: HistoryEntry,
    retention: usize,
) -> Vec<HistoryEntry> {
    history.retain(|entry| entry.date < day.date);
    history.sort_by_key(|entry| entry.date);
    record_entry(&mut history, day, retention);
    history
}
