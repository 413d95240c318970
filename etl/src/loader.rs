use shared::ForecastTable;
use uuid::Uuid;

use crate::error::Result;
use crate::sheets::{sheet_row, SheetSink};
use crate::store::ForecastStore;

/// Upsert a run's table into the store.
pub async fn load_store<S>(store: &S, table: &ForecastTable, run_id: Uuid) -> Result<usize>
where
    S: ForecastStore + ?Sized,
{
    let written = store.upsert(table, run_id).await?;
    log::info!(
        "Upserted {} forecast rows for {} spots",
        written,
        table.spot_ids().len()
    );
    Ok(written)
}

/// Replace the sheet contents with the store's current snapshot.
///
/// Not transactional with the store: a failure here leaves the store updated
/// and the sheet possibly cleared.
pub async fn copy_to_sheet<S, K>(store: &S, sheet: &K) -> Result<usize>
where
    S: ForecastStore + ?Sized,
    K: SheetSink + ?Sized,
{
    let records = store.snapshot().await?;
    let rows: Vec<_> = records.iter().map(sheet_row).collect();

    sheet.clear().await?;
    let written = sheet.append(rows).await?;
    log::info!("Copied {} rows to the sheet", written);
    Ok(written)
}
