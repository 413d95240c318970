//! Test fixtures: Surfline-shaped payloads and local HTTP servers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use shared::Location;
use warp::http::StatusCode;
use warp::Filter;

use crate::surfline::SpotPayload;

/// Spot-local UTC offset of the fixtures, in hours (US Pacific daylight time).
pub const UTC_OFFSET_HOURS: i64 = -7;

/// 2022-08-14 00:00 local time at the fixture spot.
pub fn start_timestamp() -> i64 {
    Utc.with_ymd_and_hms(2022, 8, 14, 7, 0, 0)
        .unwrap()
        .timestamp()
}

pub fn location() -> Location {
    Location {
        spot_id: "5842041f4e65fad6a7708827".to_string(),
        spot_name: "Ocean Beach Overview".to_string(),
        subregion: Some("San Francisco".to_string()),
        region: Some("Northern California".to_string()),
    }
}

#[derive(Clone, Debug)]
pub struct Feeds {
    pub wave: Value,
    pub wind: Value,
    pub weather: Value,
    pub tides: Value,
}

impl Feeds {
    pub fn into_payload(self, location: Location) -> SpotPayload {
        SpotPayload {
            location,
            wave: self.wave,
            wind: self.wind,
            weather: self.weather,
            tides: self.tides,
        }
    }
}

/// Feeds covering `days` local days, wave/wind/weather every `interval_hours`,
/// tides hourly plus one HIGH and one LOW event per day.
pub fn surfline_feeds(days: i64, interval_hours: i64) -> Feeds {
    let start = start_timestamp();
    let steps = days * 24 / interval_hours;
    let times: Vec<i64> = (0..steps).map(|i| start + i * interval_hours * 3600).collect();

    let wave: Vec<Value> = times
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            json!({
                "timestamp": ts,
                "utcOffset": UTC_OFFSET_HOURS,
                "surf": {
                    "min": 2,
                    "max": 3,
                    "humanRelation": "Waist to shoulder high",
                    "raw": { "min": 2.1, "max": 3.0 + (i % 4) as f64 * 0.25 }
                },
                "swells": [
                    { "height": 1.2, "period": 8, "direction": 285.0 },
                    { "height": 2.6, "period": 14, "direction": 210.0 },
                    { "height": 0, "period": 0, "direction": 0 },
                    { "height": 0.4, "period": 6, "direction": 300.0 },
                    { "height": 0, "period": 0, "direction": 0 },
                    { "height": 0, "period": 0, "direction": 0 }
                ]
            })
        })
        .collect();

    let wind: Vec<Value> = times
        .iter()
        .map(|ts| {
            json!({
                "timestamp": ts,
                "utcOffset": UTC_OFFSET_HOURS,
                "speed": 7.5,
                "direction": 292.0,
                "directionType": "Onshore",
                "gust": 11.2
            })
        })
        .collect();

    let weather: Vec<Value> = times
        .iter()
        .map(|ts| {
            json!({
                "timestamp": ts,
                "utcOffset": UTC_OFFSET_HOURS,
                "temperature": 16.5,
                "condition": "NIGHT_CLEAR"
            })
        })
        .collect();

    let sunlight: Vec<Value> = (0..days)
        .map(|d| {
            let midnight = start + d * 86_400;
            json!({
                "midnight": midnight,
                "midnightUTCOffset": UTC_OFFSET_HOURS,
                "dawn": midnight + 5 * 3600 + 50 * 60,
                "sunrise": midnight + 6 * 3600 + 20 * 60,
                "sunset": midnight + 20 * 3600,
                "dusk": midnight + 20 * 3600 + 30 * 60
            })
        })
        .collect();

    let mut tides: Vec<Value> = (0..days * 24)
        .map(|h| {
            json!({
                "timestamp": start + h * 3600,
                "utcOffset": UTC_OFFSET_HOURS,
                "type": "NORMAL",
                "height": 1.0 + (h % 12) as f64 * 0.1
            })
        })
        .collect();
    for d in 0..days {
        let midnight = start + d * 86_400;
        tides.push(json!({
            "timestamp": midnight + 3 * 3600 + 17 * 60,
            "utcOffset": UTC_OFFSET_HOURS,
            "type": "HIGH",
            "height": 1.9
        }));
        tides.push(json!({
            "timestamp": midnight + 9 * 3600 + 41 * 60,
            "utcOffset": UTC_OFFSET_HOURS,
            "type": "LOW",
            "height": -0.2
        }));
    }

    Feeds {
        wave: json!({
            "associated": { "units": { "waveHeight": "FT" }, "location": { "lat": 37.75, "lon": -122.51 } },
            "data": { "wave": wave }
        }),
        wind: json!({
            "associated": { "units": { "windSpeed": "KTS" } },
            "data": { "wind": wind }
        }),
        weather: json!({
            "associated": { "units": { "temperature": "C" } },
            "data": { "sunlightTimes": sunlight, "weather": weather }
        }),
        tides: json!({
            "associated": {
                "units": { "tideHeight": "M" },
                "tideLocation": { "name": "San Francisco", "lat": 37.8, "lon": -122.46 }
            },
            "data": { "tides": tides }
        }),
    }
}

/// Local stand-in for the Surfline forecast API.
pub struct FeedServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

impl FeedServer {
    /// (feed, query) of every request received so far.
    pub fn requests(&self) -> Vec<(String, HashMap<String, String>)> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn serve_feeds(feeds: Feeds) -> FeedServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = requests.clone();

    let routes = warp::path!("kbyg" / "spots" / "forecasts" / String)
        .and(warp::query::<HashMap<String, String>>())
        .map(move |feed: String, query: HashMap<String, String>| {
            log.lock().unwrap().push((feed.clone(), query));
            let (body, status) = match feed.as_str() {
                "wave" => (feeds.wave.clone(), StatusCode::OK),
                "wind" => (feeds.wind.clone(), StatusCode::OK),
                "weather" => (feeds.weather.clone(), StatusCode::OK),
                "tides" => (feeds.tides.clone(), StatusCode::OK),
                _ => (json!({ "message": "not found" }), StatusCode::NOT_FOUND),
            };
            warp::reply::with_status(warp::reply::json(&body), status)
        });

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    FeedServer {
        base_url: format!("http://{}/kbyg/spots/forecasts", addr),
        requests,
    }
}

/// Server answering every request with the given status.
pub async fn serve_status(status: u16) -> String {
    let status = StatusCode::from_u16(status).unwrap();
    let routes = warp::any().map(move || {
        warp::reply::with_status(warp::reply::json(&json!({ "message": "error" })), status)
    });

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

/// Server answering every request with `body` and a 200.
pub async fn serve_raw(body: &'static str) -> String {
    let routes = warp::any().map(move || body);

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}
