//! Flattens the four Surfline feeds of a spot into forecast rows.
//!
//! Rows are keyed on the wave feed's timestamps. Wind, weather and tide
//! readings are joined on the exact same timestamp, and the sunlight times
//! of the spot-local calendar day are attached to every row of that day. A reading
//! missing from any feed fails the whole spot: no partial rows.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use shared::{ForecastRecord, ForecastTable, Location, TideExtreme, SWELL_COUNT, TIDE_NORMAL};

use crate::error::{EtlError, Result};
use crate::surfline::{Feed, SpotPayload};

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct WaveData {
    wave: Vec<WaveHour>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WaveHour {
    timestamp: i64,
    utc_offset: f64,
    surf: Surf,
    swells: Vec<Swell>,
    #[serde(default)]
    water_temp: Option<WaterTemp>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Surf {
    human_relation: String,
    raw: HeightRange,
}

#[derive(Deserialize)]
struct HeightRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct Swell {
    height: f64,
    period: f64,
}

#[derive(Deserialize)]
struct WaterTemp {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct WindData {
    wind: Vec<WindHour>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindHour {
    timestamp: i64,
    speed: f64,
    direction: f64,
    direction_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherData {
    weather: Vec<WeatherHour>,
    sunlight_times: Vec<SunlightDay>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherHour {
    timestamp: i64,
    utc_offset: f64,
    temperature: f64,
}

#[derive(Deserialize)]
struct SunlightDay {
    midnight: i64,
    /// Offset in effect at `midnight`; differs from later readings of the
    /// day on a daylight saving change.
    #[serde(rename = "midnightUTCOffset")]
    midnight_utc_offset: f64,
    dawn: i64,
    sunrise: i64,
    sunset: i64,
    dusk: i64,
}

#[derive(Deserialize)]
struct TidesData {
    tides: Vec<TideHour>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TideHour {
    timestamp: i64,
    utc_offset: f64,
    #[serde(rename = "type")]
    kind: String,
    height: f64,
}

/// Decoded feeds of one spot, indexed by timestamp for the join.
struct SpotFeeds<'a> {
    location: &'a Location,
    wind: HashMap<i64, &'a WindHour>,
    weather: HashMap<i64, &'a WeatherHour>,
    sunlight: HashMap<NaiveDate, &'a SunlightDay>,
    tides: HashMap<i64, &'a TideHour>,
}

impl<'a> SpotFeeds<'a> {
    fn new(
        location: &'a Location,
        wind: &'a WindData,
        weather: &'a WeatherData,
        tides: &'a TidesData,
    ) -> Result<Self> {
        let mut sunlight = HashMap::new();
        for day in &weather.sunlight_times {
            let date = local_date(day.midnight, offset_minutes(day.midnight_utc_offset))
                .ok_or_else(|| {
                    EtlError::schema(&location.spot_id, Feed::Weather.as_str(), out_of_range(day.midnight))
                })?;
            sunlight.insert(date, day);
        }

        let mut tides_by_time: HashMap<i64, &TideHour> = HashMap::new();
        for tide in &tides.tides {
            // a HIGH/LOW event landing on an hourly reading wins over NORMAL
            tides_by_time
                .entry(tide.timestamp)
                .and_modify(|current| {
                    if tide.kind != TIDE_NORMAL {
                        *current = tide;
                    }
                })
                .or_insert(tide);
        }

        Ok(SpotFeeds {
            location,
            wind: wind.wind.iter().map(|w| (w.timestamp, w)).collect(),
            weather: weather.weather.iter().map(|w| (w.timestamp, w)).collect(),
            sunlight,
            tides: tides_by_time,
        })
    }

    fn missing(&self, feed: Feed, what: &str, timestamp: i64) -> EtlError {
        EtlError::schema(
            &self.location.spot_id,
            feed.as_str(),
            format!("no {} for timestamp {}", what, timestamp),
        )
    }

    fn record_at(&self, hour: &WaveHour) -> Result<ForecastRecord> {
        let ts = hour.timestamp;
        let spot_id = &self.location.spot_id;

        let wind = self
            .wind
            .get(&ts)
            .ok_or_else(|| self.missing(Feed::Wind, "reading", ts))?;
        let weather = self
            .weather
            .get(&ts)
            .ok_or_else(|| self.missing(Feed::Weather, "reading", ts))?;
        let tide = self
            .tides
            .get(&ts)
            .ok_or_else(|| self.missing(Feed::Tides, "reading", ts))?;

        let wave_offset = offset_minutes(hour.utc_offset);
        let weather_offset = offset_minutes(weather.utc_offset);
        let date = local_date(ts, weather_offset)
            .ok_or_else(|| EtlError::schema(spot_id, Feed::Weather.as_str(), out_of_range(ts)))?;
        let sunlight = self
            .sunlight
            .get(&date)
            .ok_or_else(|| self.missing(Feed::Weather, "sunlight times", ts))?;

        let local = |feed: Feed, timestamp: i64, offset: i32| {
            local_time(timestamp, offset)
                .ok_or_else(|| EtlError::schema(spot_id, feed.as_str(), out_of_range(timestamp)))
        };

        Ok(ForecastRecord {
            spot_id: spot_id.clone(),
            forecast_time: DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| EtlError::schema(spot_id, Feed::Wave.as_str(), out_of_range(ts)))?,
            spot_name: self.location.spot_name.clone(),
            subregion: self.location.subregion.clone(),
            region: self.location.region.clone(),
            utc_offset_minutes: wave_offset,
            local_time: local(Feed::Wave, ts, wave_offset)?,
            wave_min_height: hour.surf.raw.min,
            wave_max_height: hour.surf.raw.max,
            human_relation: hour.surf.human_relation.clone(),
            wave_period: dominant_period(&hour.swells),
            swell_heights: swell_heights(&hour.swells),
            wind_speed: wind.speed,
            wind_direction: wind.direction,
            wind_direction_type: wind.direction_type.clone(),
            air_temperature: weather.temperature,
            water_temperature: hour
                .water_temp
                .as_ref()
                .map(|water| (water.min + water.max) / 2.0),
            tide_height: tide.height,
            tide_type: tide.kind.clone(),
            first_light: local(Feed::Weather, sunlight.dawn, weather_offset)?,
            sunrise: local(Feed::Weather, sunlight.sunrise, weather_offset)?,
            sunset: local(Feed::Weather, sunlight.sunset, weather_offset)?,
            last_light: local(Feed::Weather, sunlight.dusk, weather_offset)?,
        })
    }
}

fn decode<T: DeserializeOwned>(location: &Location, feed: Feed, value: &Value) -> Result<T> {
    Envelope::<T>::deserialize(value)
        .map(|envelope| envelope.data)
        .map_err(|e| EtlError::schema(&location.spot_id, feed.as_str(), e))
}

fn offset_minutes(utc_offset_hours: f64) -> i32 {
    (utc_offset_hours * 60.0).round() as i32
}

/// Wall-clock time at a spot `offset_minutes` away from UTC. `None` when
/// out of chrono's range.
fn local_time(timestamp: i64, offset_minutes: i32) -> Option<NaiveDateTime> {
    let local = timestamp.checked_add(i64::from(offset_minutes) * 60)?;
    DateTime::<Utc>::from_timestamp(local, 0).map(|t| t.naive_utc())
}

/// Spot-local calendar day of `timestamp`.
fn local_date(timestamp: i64, offset_minutes: i32) -> Option<NaiveDate> {
    local_time(timestamp, offset_minutes).map(|t| t.date())
}

fn out_of_range(timestamp: i64) -> String {
    format!("timestamp {} out of range", timestamp)
}

fn swell_heights(swells: &[Swell]) -> [Option<f64>; SWELL_COUNT] {
    let mut heights = [None; SWELL_COUNT];
    for (slot, swell) in heights.iter_mut().zip(swells) {
        if swell.height > 0.0 {
            *slot = Some(swell.height);
        }
    }
    heights
}

/// Period of the highest swell, if any swell has a positive height.
fn dominant_period(swells: &[Swell]) -> Option<f64> {
    swells
        .iter()
        .filter(|swell| swell.height > 0.0)
        .max_by(|a, b| a.height.total_cmp(&b.height))
        .map(|swell| swell.period)
}

/// Build the rows of one spot.
///
/// Returns one record per distinct wave timestamp, plus the HIGH/LOW tide
/// events of the tides feed.
pub fn transform_spot(payload: &SpotPayload) -> Result<ForecastTable> {
    let location = &payload.location;

    let wave: WaveData = decode(location, Feed::Wave, &payload.wave)?;
    let wind: WindData = decode(location, Feed::Wind, &payload.wind)?;
    let weather: WeatherData = decode(location, Feed::Weather, &payload.weather)?;
    let tides: TidesData = decode(location, Feed::Tides, &payload.tides)?;

    if wave.wave.is_empty() {
        return Err(EtlError::schema(
            &location.spot_id,
            Feed::Wave.as_str(),
            "no wave readings",
        ));
    }

    let feeds = SpotFeeds::new(location, &wind, &weather, &tides)?;

    let mut table = ForecastTable::new();
    for hour in &wave.wave {
        if table.insert(feeds.record_at(hour)?).is_some() {
            log::debug!(
                "Duplicate wave reading at {} for {}, keeping the last one",
                hour.timestamp,
                location.spot_id
            );
        }
    }

    for tide in tides.tides.iter().filter(|t| t.kind != TIDE_NORMAL) {
        let offset = offset_minutes(tide.utc_offset);
        let bad_time = || {
            EtlError::schema(
                &location.spot_id,
                Feed::Tides.as_str(),
                out_of_range(tide.timestamp),
            )
        };
        table.insert_tide_extreme(TideExtreme {
            spot_id: location.spot_id.clone(),
            event_time: DateTime::from_timestamp(tide.timestamp, 0).ok_or_else(bad_time)?,
            local_time: local_time(tide.timestamp, offset).ok_or_else(bad_time)?,
            tide_type: tide.kind.clone(),
            height: tide.height,
        });
    }

    Ok(table)
}

/// Build the rows of every spot. All or nothing: the first bad spot fails the run.
pub fn transform_all(payloads: &[SpotPayload]) -> Result<ForecastTable> {
    let mut table = ForecastTable::new();
    for payload in payloads {
        let spot_table = transform_spot(payload)?;
        log::debug!(
            "Transformed {} rows and {} tide extremes for {}",
            spot_table.len(),
            spot_table.tide_extreme_count(),
            payload.location.spot_name
        );
        table.merge(spot_table);
    }
    Ok(table)
}
