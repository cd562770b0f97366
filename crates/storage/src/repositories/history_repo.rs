use async_trait::async_trait;
use chrono::NaiveDate;
use common::models::{HistoryEntry, SignalVector};
use common::traits::HistoryStore;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::StorageError;

/// SQLite-backed history, one row per date, capped at the `retention` most
/// recent dates.
#[derive(Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
    retention: usize,
}

impl HistoryRepository {
    pub fn new(pool: SqlitePool, retention: usize) -> Self {
        Self { pool, retention }
    }

    /// `INSERT OR REPLACE` swaps out any row for the same date. Rows are
    /// ordered by date, so a backfilled day takes its place among its neighbours.
    pub async fn insert(&self, entry: &HistoryEntry) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
                INSERT OR REPLACE INTO history (
                    date, timestamp, btc, gold, usdjpy, eurusd,
                    scenario_id, scenario_name, confidence
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.date)
        .bind(entry.timestamp)
        .bind(entry.signals.btc.as_str())
        .bind(entry.signals.gold.as_str())
        .bind(entry.signals.usdjpy.as_str())
        .bind(entry.signals.eurusd.as_str())
        .bind(entry.scenario_id)
        .bind(&entry.scenario_name)
        .bind(entry.confidence)
        .execute(&mut *tx)
        .await?;

        let evicted = sqlx::query(
            r#"
                DELETE FROM history WHERE date NOT IN (
                    SELECT date FROM history ORDER BY date DESC LIMIT ?
                )
            "#,
        )
        .bind(self.retention as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        if evicted > 0 {
            debug!("Evicted {} history rows beyond retention {}", evicted, self.retention);
        }
        Ok(())
    }

    /// Up to `limit` most recent dates, oldest first.
    pub async fn fetch_recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StorageError> {
        let rows = sqlx::query(
            r#"
                SELECT date, timestamp, btc, gold, usdjpy, eurusd,
                       scenario_id, scenario_name, confidence
                FROM history ORDER BY date DESC LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    pub async fn delete_all(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM history").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn decode_row(row: &SqliteRow) -> Result<HistoryEntry, StorageError> {
    let signals = SignalVector::new(
        row.try_get::<String, _>("btc")?.parse()?,
        row.try_get::<String, _>("gold")?.parse()?,
        row.try_get::<String, _>("usdjpy")?.parse()?,
        row.try_get::<String, _>("eurusd")?.parse()?,
    );

    Ok(HistoryEntry {
        date: row.try_get::<NaiveDate, _>("date")?,
        timestamp: row.try_get("timestamp")?,
        signals,
        scenario_id: row.try_get("scenario_id")?,
        scenario_name: row.try_get("scenario_name")?,
        confidence: row.try_get("confidence")?,
    })
}

#[async_trait]
impl HistoryStore for HistoryRepository {
    async fn record(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.insert(entry).await?;
        Ok(())
    }

    async fn load_recent(&self, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        Ok(self.fetch_recent(limit).await?)
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let removed = self.delete_all().await?;
        debug!("Cleared {} history rows", removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use common::models::Signal;

    fn entry(day: u32, scenario_id: u32) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            timestamp: 1_735_689_600_000 + i64::from(day) * 86_400_000,
            signals: SignalVector::new(Signal::Down, Signal::Up, Signal::Up, Signal::Down),
            scenario_id,
            scenario_name: format!("Scenario {}", scenario_id),
            confidence: 84,
        }
    }

    async fn repository(retention: usize) -> HistoryRepository {
        HistoryRepository::new(open_in_memory().await.unwrap(), retention)
    }

    #[tokio::test]
    async fn test_insert_and_fetch_in_order() {
        let repo = repository(30).await;
        for day in 1..=3 {
            repo.insert(&entry(day, day)).await.unwrap();
        }

        let history = repo.fetch_recent(30).await.unwrap();
        assert_eq!(history, vec![entry(1, 1), entry(2, 2), entry(3, 3)]);
    }

    #[tokio::test]
    async fn test_same_day_replaces_in_date_order() {
        let repo = repository(30).await;
        repo.insert(&entry(1, 1)).await.unwrap();
        repo.insert(&entry(2, 2)).await.unwrap();
        repo.insert(&entry(1, 6)).await.unwrap();

        let ids: Vec<u32> = repo
            .fetch_recent(30)
            .await
            .unwrap()
            .iter()
            .map(|e| e.scenario_id)
            .collect();
        assert_eq!(ids, vec![6, 2]);
    }

    #[tokio::test]
    async fn test_backfill_sorted_by_date() {
        let repo = repository(3).await;
        repo.insert(&entry(3, 3)).await.unwrap();
        repo.insert(&entry(5, 5)).await.unwrap();
        repo.insert(&entry(4, 4)).await.unwrap();

        let history = repo.fetch_recent(2).await.unwrap();
        assert_eq!(history, vec![entry(4, 4), entry(5, 5)]);

        repo.insert(&entry(1, 1)).await.unwrap();
        let ids: Vec<u32> = repo
            .fetch_recent(30)
            .await
            .unwrap()
            .iter()
            .map(|e| e.scenario_id)
            .collect();
        assert_eq!(ids, vec![3, 4, 5], "older backfill falls outside retention");
    }

    #[tokio::test]
    async fn test_retention_evicts_oldest() {
        let repo = repository(3).await;
        for day in 1..=5 {
            repo.insert(&entry(day, day)).await.unwrap();
        }

        let history = repo.fetch_recent(10).await.unwrap();
        let days: Vec<u32> = history.iter().map(|e| e.scenario_id).collect();
        assert_eq!(days, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_fetch_limit_keeps_most_recent() {
        let repo = repository(30).await;
        for day in 1..=10 {
            repo.insert(&entry(day, day)).await.unwrap();
        }

        let history = repo.fetch_recent(7).await.unwrap();
        assert_eq!(history.len(), 7);
        assert_eq!(history.first().unwrap().scenario_id, 4);
        assert_eq!(history.last().unwrap().scenario_id, 10);
    }

    #[tokio::test]
    async fn test_clear_through_store_trait() {
        let repo = repository(30).await;
        let store: &dyn HistoryStore = &repo;
        store.record(&entry(1, 1)).await.unwrap();
        store.record(&entry(2, 2)).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.load_recent(30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_signal_is_reported() {
        let repo = repository(30).await;
        sqlx::query(
            "INSERT INTO history (date, timestamp, btc, gold, usdjpy, eurusd, scenario_id, scenario_name, confidence)
             VALUES ('2025-01-01', 0, 'sideways', 'up', 'up', 'up', 1, 'x', 50)",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo.fetch_recent(30).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
