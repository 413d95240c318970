//! One ETL run: Surfline → transform → store → sheet.

use shared::{ForecastTable, Location};
use uuid::Uuid;

use crate::error::Result;
use crate::loader;
use crate::retry::{with_retry, RetryConfig};
use crate::sheets::SheetSink;
use crate::store::ForecastStore;
use crate::surfline::{FetchOptions, SurflineClient};
use crate::transform;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub spots: usize,
    pub rows: usize,
    pub tide_extremes: usize,
    /// Rows copied to the sheet, `None` when the sheet stage is disabled.
    pub sheet_rows: Option<usize>,
}

/// Fetch every spot and build the run's table.
pub async fn extract(
    client: &SurflineClient,
    spots: &[Location],
    options: &FetchOptions,
) -> Result<ForecastTable> {
    let payloads = client.fetch_all(spots, options).await?;
    let table = transform::transform_all(&payloads)?;
    log::info!(
        "Built {} forecast rows and {} tide extremes from {} spots",
        table.len(),
        table.tide_extreme_count(),
        spots.len()
    );
    Ok(table)
}

pub struct Pipeline<S, K> {
    client: SurflineClient,
    spots: Vec<Location>,
    options: FetchOptions,
    store: S,
    sheet: Option<K>,
}

impl<S, K> Pipeline<S, K>
where
    S: ForecastStore,
    K: SheetSink,
{
    pub fn new(
        client: SurflineClient,
        spots: Vec<Location>,
        options: FetchOptions,
        store: S,
        sheet: Option<K>,
    ) -> Self {
        Pipeline {
            client,
            spots,
            options,
            store,
            sheet,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch, transform and upsert. Returns the table that was written.
    async fn store_stage(&self, run_id: Uuid) -> Result<ForecastTable> {
        let table = extract(&self.client, &self.spots, &self.options).await?;
        loader::load_store(&self.store, &table, run_id).await?;
        Ok(table)
    }

    /// Run both stages, each retried per `retry`. The sheet stage only runs
    /// once the store stage succeeded.
    pub async fn run(&self, retry: &RetryConfig) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        log::info!("Starting run {} for {} spots", run_id, self.spots.len());

        let table = with_retry("store stage", || self.store_stage(run_id), retry).await?;

        let sheet_rows = match &self.sheet {
            Some(sheet) => Some(
                with_retry(
                    "sheet stage",
                    || loader::copy_to_sheet(&self.store, sheet),
                    retry,
                )
                .await?,
            ),
            None => None,
        };

        let summary = RunSummary {
            run_id,
            spots: table.spot_ids().len(),
            rows: table.len(),
            tide_extremes: table.tide_extreme_count(),
            sheet_rows,
        };
        log::info!("Finished run {}: {:?}", run_id, summary);
        Ok(summary)
    }
}
