//! Daily trigger for the pipeline.
//!
//! Sleeps until the next cron occurrence (UTC), runs the pipeline and goes
//! back to sleep. A failed run is logged and the next occurrence still fires.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::pipeline::Pipeline;
use crate::retry::RetryConfig;
use crate::sheets::SheetSink;
use crate::store::ForecastStore;

/// Every day at 13:00 UTC.
pub const DEFAULT_SCHEDULE: &str = "0 0 13 * * *";

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Invalid cron expression: {0}")]
    CronParse(String),
}

type Result<T> = std::result::Result<T, SchedulerError>;

/// Pad a standard 5-field expression (min hr dom month dow) with a zero
/// seconds field, as the `cron` crate expects 6 fields.
fn normalize_cron_expr(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(&normalize_cron_expr(expr))
        .map_err(|e| SchedulerError::CronParse(format!("{}: {}", expr, e)))
}

pub fn next_run_after(schedule: &Schedule, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
    schedule
        .after(&after)
        .next()
        .ok_or_else(|| SchedulerError::CronParse("no next occurrence".to_string()))
}

/// Run the pipeline on every occurrence of `schedule` until Ctrl-C.
pub async fn run_daily<S, K>(
    pipeline: &Pipeline<S, K>,
    schedule: &Schedule,
    retry: &RetryConfig,
) -> Result<()>
where
    S: ForecastStore,
    K: SheetSink,
{
    loop {
        let now = Utc::now();
        let next = next_run_after(schedule, now)?;
        let wait = (next - now).to_std().unwrap_or_default();
        log::info!(
            "[Scheduler] next run at {} (in {:?}, {} retries per stage)",
            next,
            wait,
            retry.max_retries()
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("[Scheduler] shutdown signal received, exiting");
                return Ok(());
            }
        }

        match pipeline.run(retry).await {
            Ok(summary) => log::info!(
                "[Scheduler] run {} wrote {} rows",
                summary.run_id,
                summary.rows
            ),
            Err(e) => log::error!("[Scheduler] run failed: {}", e),
        }
    }
}
