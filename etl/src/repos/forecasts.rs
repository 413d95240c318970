use shared::{ForecastRecord, SWELL_COUNT};
use tokio_postgres::{Row, Transaction};
use uuid::Uuid;

use crate::db;

const UPSERT_STMT: &str = r#"
    INSERT INTO forecasts (
        spot_id, forecast_time, spot_name, subregion, region,
        utc_offset_minutes, local_time,
        wave_min_height, wave_max_height, human_relation, wave_period,
        swell_height_1, swell_height_2, swell_height_3,
        swell_height_4, swell_height_5, swell_height_6,
        wind_speed, wind_direction, wind_direction_type,
        air_temperature, water_temperature,
        tide_height, tide_type,
        first_light, sunrise, sunset, last_light,
        run_id, updated_at)
    VALUES (
        $1, $2, $3, $4, $5,
        $6, $7,
        $8, $9, $10, $11,
        $12, $13, $14,
        $15, $16, $17,
        $18, $19, $20,
        $21, $22,
        $23, $24,
        $25, $26, $27, $28,
        $29, now())
    ON CONFLICT (spot_id, forecast_time) DO UPDATE SET
        spot_name = EXCLUDED.spot_name,
        subregion = EXCLUDED.subregion,
        region = EXCLUDED.region,
        utc_offset_minutes = EXCLUDED.utc_offset_minutes,
        local_time = EXCLUDED.local_time,
        wave_min_height = EXCLUDED.wave_min_height,
        wave_max_height = EXCLUDED.wave_max_height,
        human_relation = EXCLUDED.human_relation,
        wave_period = EXCLUDED.wave_period,
        swell_height_1 = EXCLUDED.swell_height_1,
        swell_height_2 = EXCLUDED.swell_height_2,
        swell_height_3 = EXCLUDED.swell_height_3,
        swell_height_4 = EXCLUDED.swell_height_4,
        swell_height_5 = EXCLUDED.swell_height_5,
        swell_height_6 = EXCLUDED.swell_height_6,
        wind_speed = EXCLUDED.wind_speed,
        wind_direction = EXCLUDED.wind_direction,
        wind_direction_type = EXCLUDED.wind_direction_type,
        air_temperature = EXCLUDED.air_temperature,
        water_temperature = EXCLUDED.water_temperature,
        tide_height = EXCLUDED.tide_height,
        tide_type = EXCLUDED.tide_type,
        first_light = EXCLUDED.first_light,
        sunrise = EXCLUDED.sunrise,
        sunset = EXCLUDED.sunset,
        last_light = EXCLUDED.last_light,
        run_id = EXCLUDED.run_id,
        updated_at = EXCLUDED.updated_at"#;

const SELECT_ALL_STMT: &str = r#"
    SELECT spot_id, forecast_time, spot_name, subregion, region,
           utc_offset_minutes, local_time,
           wave_min_height, wave_max_height, human_relation, wave_period,
           swell_height_1, swell_height_2, swell_height_3,
           swell_height_4, swell_height_5, swell_height_6,
           wind_speed, wind_direction, wind_direction_type,
           air_temperature, water_temperature,
           tide_height, tide_type,
           first_light, sunrise, sunset, last_light
    FROM forecasts
    ORDER BY spot_id, forecast_time"#;

/// Upsert every record with one prepared statement. Returns the rows touched.
pub async fn upsert_all<'a, I>(
    tx: &Transaction<'_>,
    records: I,
    run_id: &Uuid,
) -> Result<u64, tokio_postgres::Error>
where
    I: IntoIterator<Item = &'a ForecastRecord>,
{
    let stmt = tx.prepare(UPSERT_STMT).await?;
    let mut written = 0;
    for r in records {
        let [s1, s2, s3, s4, s5, s6] = &r.swell_heights;
        written += tx
            .execute(
                &stmt,
                &[
                    &r.spot_id,
                    &r.forecast_time,
                    &r.spot_name,
                    &r.subregion,
                    &r.region,
                    &r.utc_offset_minutes,
                    &r.local_time,
                    &r.wave_min_height,
                    &r.wave_max_height,
                    &r.human_relation,
                    &r.wave_period,
                    s1,
                    s2,
                    s3,
                    s4,
                    s5,
                    s6,
                    &r.wind_speed,
                    &r.wind_direction,
                    &r.wind_direction_type,
                    &r.air_temperature,
                    &r.water_temperature,
                    &r.tide_height,
                    &r.tide_type,
                    &r.first_light,
                    &r.sunrise,
                    &r.sunset,
                    &r.last_light,
                    run_id,
                ],
            )
            .await?;
    }
    Ok(written)
}

/// Every stored forecast, grouped by spot and ordered by time.
pub async fn list_all<'a>(client: &db::Client<'a>) -> Result<Vec<ForecastRecord>, tokio_postgres::Error> {
    let rows = client.query(SELECT_ALL_STMT, &[]).await?;
    super::from_rows(rows, record_from_row)
}

pub async fn count<'a>(client: &db::Client<'a>) -> Result<i64, tokio_postgres::Error> {
    let row = client.query_one("SELECT COUNT(*) FROM forecasts", &[]).await?;
    row.try_get(0)
}

fn record_from_row(row: &Row) -> Result<ForecastRecord, tokio_postgres::Error> {
    let mut swell_heights = [None; SWELL_COUNT];
    for (i, slot) in swell_heights.iter_mut().enumerate() {
        *slot = row.try_get(format!("swell_height_{}", i + 1).as_str())?;
    }

    Ok(ForecastRecord {
        spot_id: row.try_get("spot_id")?,
        forecast_time: row.try_get("forecast_time")?,
        spot_name: row.try_get("spot_name")?,
        subregion: row.try_get("subregion")?,
        region: row.try_get("region")?,
        utc_offset_minutes: row.try_get("utc_offset_minutes")?,
        local_time: row.try_get("local_time")?,
        wave_min_height: row.try_get("wave_min_height")?,
        wave_max_height: row.try_get("wave_max_height")?,
        human_relation: row.try_get("human_relation")?,
        wave_period: row.try_get("wave_period")?,
        swell_heights,
        wind_speed: row.try_get("wind_speed")?,
        wind_direction: row.try_get("wind_direction")?,
        wind_direction_type: row.try_get("wind_direction_type")?,
        air_temperature: row.try_get("air_temperature")?,
        water_temperature: row.try_get("water_temperature")?,
        tide_height: row.try_get("tide_height")?,
        tide_type: row.try_get("tide_type")?,
        first_light: row.try_get("first_light")?,
        sunrise: row.try_get("sunrise")?,
        sunset: row.try_get("sunset")?,
        last_light: row.try_get("last_light")?,
    })
}
