use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;

use crate::error::{EtlError, Result};

pub type Pool = bb8::Pool<PostgresConnectionManager<NoTls>>;
pub type Client<'a> = bb8::PooledConnection<'a, PostgresConnectionManager<NoTls>>;

const MAX_CONNECTIONS: u32 = 4;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

pub async fn pool(database_url: &str) -> Result<Pool> {
    let config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e| EtlError::storage("postgres", format!("invalid database url: {}", e)))?;
    let mgr = PostgresConnectionManager::new(config, NoTls);

    let pool = bb8::Pool::builder()
        .max_size(MAX_CONNECTIONS)
        .build(mgr)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &Pool) -> Result<()> {
    let mut conn = pool.dedicated_connection().await?;

    let report = embedded::migrations::runner()
        .run_async(&mut conn)
        .await
        .map_err(|e| EtlError::storage("postgres", e))?;

    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(())
}

/// Drop every table, migration history included, then migrate from scratch.
pub async fn reset(pool: &Pool) -> Result<()> {
    {
        let conn = pool.get().await?;
        conn.batch_execute(
            "DROP TABLE IF EXISTS forecasts;
             DROP TABLE IF EXISTS tide_extremes;
             DROP TABLE IF EXISTS refinery_schema_history;",
        )
        .await?;
    }
    log::warn!("Dropped forecast tables");

    migrate(pool).await
}
