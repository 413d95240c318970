use async_trait::async_trait;
use shared::{ForecastRecord, ForecastTable};
use uuid::Uuid;

use crate::db::Pool;
use crate::error::Result;
use crate::repos;

/// Persistent forecast store: append target of every run and source of the
/// sheet copy.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Insert or overwrite every row of `table` by (spot_id, timestamp).
    /// Returns the number of forecast rows written.
    async fn upsert(&self, table: &ForecastTable, run_id: Uuid) -> Result<usize>;

    /// Current contents, grouped by spot and ordered by time.
    async fn snapshot(&self) -> Result<Vec<ForecastRecord>>;
}

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        PgStore { pool }
    }

    /// Rows held in (forecasts, tide_extremes).
    pub async fn counts(&self) -> Result<(i64, i64)> {
        let conn = self.pool.get().await?;
        let forecasts = repos::forecasts::count(&conn).await?;
        let extremes = repos::tide_extremes::count(&conn).await?;
        Ok((forecasts, extremes))
    }
}

#[async_trait]
impl ForecastStore for PgStore {
    async fn upsert(&self, table: &ForecastTable, run_id: Uuid) -> Result<usize> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;

        let written = repos::forecasts::upsert_all(&tx, table.records(), &run_id).await?;
        let extremes =
            repos::tide_extremes::upsert_all(&tx, table.tide_extremes(), &run_id).await?;

        tx.commit().await?;
        log::debug!(
            "Committed {} forecasts and {} tide extremes (run {})",
            written,
            extremes,
            run_id
        );
        Ok(written as usize)
    }

    async fn snapshot(&self) -> Result<Vec<ForecastRecord>> {
        let conn = self.pool.get().await?;
        Ok(repos::forecasts::list_all(&conn).await?)
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::db;
    use crate::surfline::SpotPayload;
    use crate::testing;
    use crate::transform::transform_spot;

    fn table(days: i64, interval_hours: i64) -> ForecastTable {
        let payload: SpotPayload =
            testing::surfline_feeds(days, interval_hours).into_payload(testing::location());
        transform_spot(&payload).unwrap()
    }

    #[tokio::test]
    async fn test_memory_upsert_is_idempotent() {
        let store = MemoryStore::default();
        let table = table(5, 3);

        store.upsert(&table, Uuid::new_v4()).await.unwrap();
        store.upsert(&table, Uuid::new_v4()).await.unwrap();

        assert_eq!(store.len(), 40);
        assert_eq!(store.snapshot().await.unwrap().len(), 40);
    }

    /// Runs against a real database when SURF_TEST_DATABASE_URL is set.
    /// The database is reset first.
    #[tokio::test]
    async fn test_pg_store() {
        let Ok(url) = std::env::var("SURF_TEST_DATABASE_URL") else {
            return;
        };
        let pool = db::pool(&url).await.unwrap();
        db::reset(&pool).await.unwrap();
        let store = PgStore::new(pool);

        let first = table(5, 1);
        assert_eq!(store.upsert(&first, Uuid::new_v4()).await.unwrap(), 120);
        assert_eq!(store.upsert(&first, Uuid::new_v4()).await.unwrap(), 120);
        assert_eq!(store.counts().await.unwrap(), (120, 10));

        // a later run overlapping the first keeps one row per key
        let mut second = table(6, 1);
        let updated: Vec<ForecastRecord> = second
            .records()
            .map(|r| ForecastRecord {
                wave_max_height: r.wave_max_height + 1.0,
                ..r.clone()
            })
            .collect();
        for record in updated {
            second.insert(record);
        }
        store.upsert(&second, Uuid::new_v4()).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 144);
        let expected: Vec<ForecastRecord> = second.records().cloned().collect();
        assert_eq!(snapshot, expected);
    }
}
