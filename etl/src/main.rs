use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::Parser;
use cli::{Cli, Command, DbSubCommand, FetchArgs};
use dialoguer::Confirm;
use retry::RetryConfig;
use sheets::GoogleSheets;
use store::PgStore;
use surfline::{FetchOptions, SurflineClient};

mod cli;
mod config;
mod db;
mod error;
mod loader;
mod pipeline;
mod repos;
mod retry;
mod scheduler;
mod sheets;
mod store;
mod surfline;
#[cfg(test)]
mod testing;
mod transform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match args.cmd {
        Command::Run(run_args) if run_args.dry_run => {
            let spots = config::load_spots(&run_args.fetch.spots)?;
            let client = surfline_client(&run_args.fetch)?;
            let table = pipeline::extract(&client, &spots, &fetch_options(&run_args.fetch)).await?;
            let records: Vec<_> = table.records().collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Run(run_args) => {
            let pool = connect(args.database_url.as_deref()).await?;
            db::migrate(&pool).await?;
            let pipeline = build_pipeline(&run_args.fetch, pool)?;

            let summary = pipeline.run(&RetryConfig::default()).await?;
            let (forecasts, extremes) = pipeline.store().counts().await?;
            log::info!(
                "Run {} done: {} rows from {} spots, store holds {} forecasts and {} tide extremes",
                summary.run_id,
                summary.rows,
                summary.spots,
                forecasts,
                extremes
            );
        }
        Command::SyncSheet { timeout_secs } => {
            let pool = connect(args.database_url.as_deref()).await?;
            let store = PgStore::new(pool);
            let sheet = GoogleSheets::new(
                config::SheetsConfig::from_env()?,
                Duration::from_secs(timeout_secs),
            )?;
            loader::copy_to_sheet(&store, &sheet).await?;
        }
        Command::Schedule(schedule_args) => {
            let schedule = scheduler::parse_schedule(&schedule_args.cron)?;
            let retry = RetryConfig::new(
                schedule_args.retries,
                Duration::from_secs(schedule_args.retry_delay_secs),
            );

            let pool = connect(args.database_url.as_deref()).await?;
            db::migrate(&pool).await?;
            let pipeline = build_pipeline(&schedule_args.fetch, pool)?;

            scheduler::run_daily(&pipeline, &schedule, &retry).await?;
        }
        Command::Db(db_cmd) => {
            let pool = connect(args.database_url.as_deref()).await?;
            match db_cmd.cmd {
                DbSubCommand::Migrate => db::migrate(&pool).await?,
                DbSubCommand::Reset { yes } => {
                    let confirmed = yes
                        || Confirm::new()
                            .with_prompt("Drop all forecast tables?")
                            .default(false)
                            .interact()?;
                    if confirmed {
                        db::reset(&pool).await?;
                    } else {
                        println!("Aborted");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<db::Pool> {
    let url = database_url
        .ok_or_else(|| anyhow!("Missing database url. Pass --database-url or set SURF_DATABASE_URL"))?;
    Ok(db::pool(url).await?)
}

fn fetch_options(args: &FetchArgs) -> FetchOptions {
    FetchOptions {
        days: args.days,
        interval_hours: args.interval_hours,
    }
}

fn surfline_client(args: &FetchArgs) -> anyhow::Result<SurflineClient> {
    Ok(SurflineClient::new(
        &args.api_url,
        Duration::from_secs(args.timeout_secs),
    )?)
}

fn build_pipeline(
    args: &FetchArgs,
    pool: db::Pool,
) -> anyhow::Result<pipeline::Pipeline<PgStore, GoogleSheets>> {
    let spots = config::load_spots(&args.spots)?;
    let sheet = if args.skip_sheet {
        None
    } else {
        let config = config::SheetsConfig::from_env()
            .context("Set the Google Sheets variables or pass --skip-sheet")?;
        Some(GoogleSheets::new(config, Duration::from_secs(args.timeout_secs))?)
    };

    Ok(pipeline::Pipeline::new(
        surfline_client(args)?,
        spots,
        fetch_options(args),
        PgStore::new(pool),
        sheet,
    ))
}
