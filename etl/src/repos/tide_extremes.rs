use shared::TideExtreme;
use tokio_postgres::Transaction;
use uuid::Uuid;

use crate::db;

const UPSERT_STMT: &str = "INSERT INTO tide_extremes (spot_id, event_time, local_time, tide_type, height, run_id) \
                           VALUES ($1, $2, $3, $4, $5, $6) \
                           ON CONFLICT (spot_id, event_time) DO UPDATE SET \
                           local_time = EXCLUDED.local_time, \
                           tide_type = EXCLUDED.tide_type, \
                           height = EXCLUDED.height, \
                           run_id = EXCLUDED.run_id";

pub async fn upsert_all<'a, I>(
    tx: &Transaction<'_>,
    extremes: I,
    run_id: &Uuid,
) -> Result<u64, tokio_postgres::Error>
where
    I: IntoIterator<Item = &'a TideExtreme>,
{
    let stmt = tx.prepare(UPSERT_STMT).await?;
    let mut written = 0;
    for extreme in extremes {
        written += tx
            .execute(
                &stmt,
                &[
                    &extreme.spot_id,
                    &extreme.event_time,
                    &extreme.local_time,
                    &extreme.tide_type,
                    &extreme.height,
                    run_id,
                ],
            )
            .await?;
    }
    Ok(written)
}

pub async fn count<'a>(client: &db::Client<'a>) -> Result<i64, tokio_postgres::Error> {
    let row = client
        .query_one("SELECT COUNT(*) FROM tide_extremes", &[])
        .await?;
    row.try_get(0)
}
