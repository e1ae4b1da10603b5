use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Emissions-API calls made on one UTC day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub count: u32,
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Daily counter of emissions-API calls.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Count for `date`, zero when nothing has been recorded yet.
    async fn today_count(&self, date: NaiveDate) -> Result<u32>;

    /// Claims one call on `date` if fewer than `limit` are recorded, returning
    /// the new count, or `None` when the day is used up. The check and the
    /// bump happen atomically.
    async fn try_reserve(&self, date: NaiveDate, limit: u32) -> Result<Option<u32>>;

    /// Gives back a slot claimed by `try_reserve` whose call failed.
    async fn release(&self, date: NaiveDate) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Process-local store for running without a hosted datastore.
#[derive(Default)]
pub struct MemoryUsageStore {
    counts: Mutex<HashMap<NaiveDate, u32>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn records(&self) -> Vec<UsageRecord> {
        let counts = self.counts.lock().await;
        let mut records: Vec<UsageRecord> = counts
            .iter()
            .map(|(date, count)| UsageRecord { date: *date, count: *count })
            .collect();
        records.sort_by_key(|r| r.date);
        records
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn today_count(&self, date: NaiveDate) -> Result<u32> {
        Ok(self.counts.lock().await.get(&date).copied().unwrap_or(0))
    }

    async fn try_reserve(&self, date: NaiveDate, limit: u32) -> Result<Option<u32>> {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(date).or_insert(0);
        if *count >= limit {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }

    async fn release(&self, date: NaiveDate) -> Result<()> {
        if let Some(count) = self.counts.lock().await.get_mut(&date) {
            *count = count.saturating_sub(1);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[tokio::test]
    async fn test_missing_day_is_zero() {
        let store = MemoryUsageStore::new();
        assert_eq!(store.today_count(day(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reserve_is_monotonic_until_limit() {
        let store = MemoryUsageStore::new();
        let mut last = store.today_count(day(2)).await.unwrap();
        for _ in 0..5 {
            let next = store.try_reserve(day(2), 5).await.unwrap().unwrap();
            assert_eq!(next, last + 1);
            last = next;
        }
        assert_eq!(store.try_reserve(day(2), 5).await.unwrap(), None);
        assert_eq!(store.today_count(day(2)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_release_returns_slot() {
        let store = MemoryUsageStore::new();
        assert_eq!(store.try_reserve(day(6), 1).await.unwrap(), Some(1));
        assert_eq!(store.try_reserve(day(6), 1).await.unwrap(), None);

        store.release(day(6)).await.unwrap();
        assert_eq!(store.today_count(day(6)).await.unwrap(), 0);
        assert_eq!(store.try_reserve(day(6), 1).await.unwrap(), Some(1));

        // Releasing an untouched day is a no-op.
        store.release(day(7)).await.unwrap();
        assert_eq!(store.today_count(day(7)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_days_are_independent() {
        let store = MemoryUsageStore::new();
        store.try_reserve(day(3), 3).await.unwrap();
        store.try_reserve(day(3), 3).await.unwrap();
        store.try_reserve(day(4), 3).await.unwrap();

        assert_eq!(
            store.records().await,
            vec![
                UsageRecord { date: day(3), count: 2 },
                UsageRecord { date: day(4), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_reservations_respect_limit() {
        let store = Arc::new(MemoryUsageStore::new());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.try_reserve(day(5), 12).await.unwrap() }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            if let Some(count) = handle.await.unwrap() {
                seen.push(count);
            }
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=12).collect::<Vec<u32>>());
        assert_eq!(store.today_count(day(5)).await.unwrap(), 12);
    }
}
