//! Google Sheets copy of the forecast store.
//!
//! The worksheet keeps its header row; everything from A2 down is cleared
//! and rewritten on each sync through the Sheets v4 `values` REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use shared::ForecastRecord;

use crate::config::SheetsConfig;
use crate::error::{EtlError, Result};

/// Header row expected in the worksheet, in column order.
pub const SHEET_COLUMNS: [&str; 28] = [
    "spot_id",
    "spot_name",
    "subregion",
    "region",
    "forecast_time_utc",
    "local_time",
    "utc_offset_minutes",
    "wave_min_height",
    "wave_max_height",
    "human_relation",
    "wave_period",
    "swell_height_1",
    "swell_height_2",
    "swell_height_3",
    "swell_height_4",
    "swell_height_5",
    "swell_height_6",
    "wind_speed",
    "wind_direction",
    "wind_direction_type",
    "air_temperature",
    "water_temperature",
    "tide_height",
    "tide_type",
    "first_light",
    "sunrise",
    "sunset",
    "last_light",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn number(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or_else(|| Value::from(""))
}

fn text(value: &Option<String>) -> Value {
    Value::from(value.as_deref().unwrap_or(""))
}

/// Sheet cells for one record, matching `SHEET_COLUMNS`. Absent values are
/// written as empty cells.
pub fn sheet_row(r: &ForecastRecord) -> Vec<Value> {
    let mut row = vec![
        Value::from(r.spot_id.as_str()),
        Value::from(r.spot_name.as_str()),
        text(&r.subregion),
        text(&r.region),
        Value::from(r.forecast_time.format(TIME_FORMAT).to_string()),
        Value::from(r.local_time.format(TIME_FORMAT).to_string()),
        Value::from(r.utc_offset_minutes),
        Value::from(r.wave_min_height),
        Value::from(r.wave_max_height),
        Value::from(r.human_relation.as_str()),
        number(r.wave_period),
    ];
    row.extend(r.swell_heights.iter().map(|h| number(*h)));
    row.extend([
        Value::from(r.wind_speed),
        Value::from(r.wind_direction),
        Value::from(r.wind_direction_type.as_str()),
        Value::from(r.air_temperature),
        number(r.water_temperature),
        Value::from(r.tide_height),
        Value::from(r.tide_type.as_str()),
        Value::from(r.first_light.format(TIME_FORMAT).to_string()),
        Value::from(r.sunrise.format(TIME_FORMAT).to_string()),
        Value::from(r.sunset.format(TIME_FORMAT).to_string()),
        Value::from(r.last_light.format(TIME_FORMAT).to_string()),
    ]);
    row
}

/// A1 column letters for a 1-based column index.
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Spreadsheet destination of the sheet copy.
#[async_trait]
pub trait SheetSink: Send + Sync {
    /// Clear every data row, keeping the header row.
    async fn clear(&self) -> Result<()>;

    /// Write rows below the header. Returns the number of rows written.
    async fn append(&self, rows: Vec<Vec<Value>>) -> Result<usize>;
}

pub struct GoogleSheets {
    client: reqwest::Client,
    config: SheetsConfig,
}

impl GoogleSheets {
    pub fn new(config: SheetsConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EtlError::storage("sheets", e))?;
        Ok(GoogleSheets { client, config })
    }

    /// Data area of the worksheet in A1 notation, below the header row.
    pub fn data_range(&self) -> String {
        format!(
            "'{}'!A2:{}",
            self.config.worksheet.replace('\'', "''"),
            column_letter(SHEET_COLUMNS.len())
        )
    }

    /// `{api}/v4/spreadsheets/{id}/values/{range}:{action}`
    fn values_url(&self, action: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| EtlError::storage("sheets", format!("invalid api url: {}", e)))?;
        let range = format!("{}:{}", self.data_range(), action);
        url.path_segments_mut()
            .map_err(|_| EtlError::storage("sheets", "api url cannot be a base"))?
            .pop_if_empty()
            .extend(&[
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        Ok(url)
    }

    async fn post(&self, url: Url, query: &[(&str, &str)], body: Value) -> Result<()> {
        let response = self
            .client
            .post(url.clone())
            .query(query)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| EtlError::storage("sheets", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EtlError::storage(
                "sheets",
                format!("unexpected status {} for {}: {}", status, url, detail),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SheetSink for GoogleSheets {
    async fn clear(&self) -> Result<()> {
        let url = self.values_url("clear")?;
        self.post(url, &[], json!({})).await?;
        log::debug!("Cleared {}", self.data_range());
        Ok(())
    }

    async fn append(&self, rows: Vec<Vec<Value>>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let count = rows.len();
        let url = self.values_url("append")?;
        let body = json!({
            "range": self.data_range(),
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.post(
            url,
            &[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "OVERWRITE"),
            ],
            body,
        )
        .await?;
        Ok(count)
    }
}
