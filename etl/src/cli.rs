use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::scheduler::DEFAULT_SCHEDULE;
use crate::surfline::{DEFAULT_DAYS, DEFAULT_INTERVAL_HOURS, MAX_DAYS, SURFLINE_BASE_URL};

const MAX_RETRIES: i64 = 10;

#[derive(Debug, Parser)]
#[command(about = "Surf forecast ETL: Surfline to PostgreSQL and Google Sheets.")]
pub struct Cli {
    #[arg(env = "SURF_DATABASE_URL", short, long)]
    pub database_url: Option<String>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline once.
    Run(RunArgs),
    /// Copy the stored forecasts to the sheet without fetching.
    SyncSheet {
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
    /// Run the pipeline on a cron schedule until interrupted.
    Schedule(ScheduleArgs),
    Db(DbCommand),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// JSON array of spots to fetch
    #[arg(long, env = "SURF_SPOTS_FILE", default_value = "spots.json")]
    pub spots: PathBuf,
    /// Forecast horizon in days
    #[arg(long, default_value_t = DEFAULT_DAYS, value_parser = clap::value_parser!(u8).range(1..=MAX_DAYS as i64))]
    pub days: u8,
    /// Hours between wave, wind and weather readings
    #[arg(long, default_value_t = DEFAULT_INTERVAL_HOURS, value_parser = clap::value_parser!(u8).range(1..=24))]
    pub interval_hours: u8,
    #[arg(long, env = "SURF_API_URL", default_value = SURFLINE_BASE_URL)]
    pub api_url: String,
    /// HTTP timeout for every request
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
    /// Only write to the database
    #[arg(long)]
    pub skip_sheet: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,
    /// Fetch and transform, print the rows as JSON and write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,
    /// Cron expression in UTC, 5 or 6 fields
    #[arg(long, env = "SURF_SCHEDULE", default_value = DEFAULT_SCHEDULE)]
    pub cron: String,
    /// Retries of a failed stage
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=MAX_RETRIES))]
    pub retries: u32,
    #[arg(long, default_value_t = 60)]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Parser)]
pub struct DbCommand {
    #[command(subcommand)]
    pub cmd: DbSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum DbSubCommand {
    Migrate,
    /// Drop every table and migrate again
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
