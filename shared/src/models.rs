use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of swell slots reported for each forecast hour.
pub const SWELL_COUNT: usize = 6;

/// Tide type for regular hourly readings; anything else is a HIGH/LOW event.
pub const TIDE_NORMAL: &str = "NORMAL";

/// A surf spot, as listed in the spots file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub spot_id: String,
    pub spot_name: String,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Location {
    pub fn new(spot_id: &str, spot_name: &str) -> Self {
        Location {
            spot_id: spot_id.to_string(),
            spot_name: spot_name.to_string(),
            subregion: None,
            region: None,
        }
    }
}

/// One flattened forecast row for one spot at one timestamp.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub spot_id: String,
    pub forecast_time: DateTime<Utc>,
    pub spot_name: String,
    pub subregion: Option<String>,
    pub region: Option<String>,
    pub utc_offset_minutes: i32,
    pub local_time: NaiveDateTime,

    pub wave_min_height: f64,
    pub wave_max_height: f64,
    pub human_relation: String,
    pub wave_period: Option<f64>,
    pub swell_heights: [Option<f64>; SWELL_COUNT],

    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_direction_type: String,

    pub air_temperature: f64,
    pub water_temperature: Option<f64>,

    pub tide_height: f64,
    pub tide_type: String,

    pub first_light: NaiveDateTime,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
    pub last_light: NaiveDateTime,
}

impl ForecastRecord {
    pub fn key(&self) -> (String, DateTime<Utc>) {
        (self.spot_id.clone(), self.forecast_time)
    }
}

/// A HIGH or LOW tide event reported between the regular hourly readings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TideExtreme {
    pub spot_id: String,
    pub event_time: DateTime<Utc>,
    pub local_time: NaiveDateTime,
    pub tide_type: String,
    pub height: f64,
}

impl TideExtreme {
    pub fn key(&self) -> (String, DateTime<Utc>) {
        (self.spot_id.clone(), self.event_time)
    }
}
