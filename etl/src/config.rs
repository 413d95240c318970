use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use shared::Location;

pub const SHEETS_API_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_WORKSHEET: &str = "GSheet_Wave_Weather_Wind_Tides";

/// Google Sheets destination, read from `SURF_SHEETS_*` variables.
#[derive(Clone, Debug, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}

fn default_api_url() -> String {
    SHEETS_API_URL.to_string()
}

impl SheetsConfig {
    pub fn from_env() -> Result<Self> {
        envy::prefixed("SURF_SHEETS_")
            .from_env::<SheetsConfig>()
            .context("Missing Google Sheets config. Required env vars: SURF_SHEETS_SPREADSHEET_ID, SURF_SHEETS_ACCESS_TOKEN")
    }
}

/// Parse a JSON array of spots, rejecting empty lists and duplicate ids.
pub fn parse_spots(json: &str) -> Result<Vec<Location>> {
    let spots: Vec<Location> = serde_json::from_str(json)?;
    if spots.is_empty() {
        return Err(anyhow!("no spots configured"));
    }

    let mut seen = HashSet::new();
    for spot in &spots {
        if !seen.insert(spot.spot_id.as_str()) {
            return Err(anyhow!("duplicate spot id {}", spot.spot_id));
        }
    }
    Ok(spots)
}

pub fn load_spots(path: &Path) -> Result<Vec<Location>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Unable to read spots file {}", path.display()))?;
    parse_spots(&json).with_context(|| format!("Invalid spots file {}", path.display()))
}
