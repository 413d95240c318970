//! Surfline "kbyg" forecast API client.
//!
//! Each spot has four forecast feeds (wave, wind, weather, tides). The
//! client fetches them one after another and hands the raw JSON documents
//! to the transformer untouched.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use shared::Location;

use crate::error::{EtlError, Result};

/// Surfline forecast endpoint; the feed name is appended as the last segment.
pub const SURFLINE_BASE_URL: &str = "https://services.surfline.com/kbyg/spots/forecasts";

/// Longest horizon the API serves.
pub const MAX_DAYS: u8 = 17;

pub const DEFAULT_DAYS: u8 = MAX_DAYS;
pub const DEFAULT_INTERVAL_HOURS: u8 = 3;

/// Tides are always fetched hourly so that high/low events are not missed.
const TIDES_INTERVAL_HOURS: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feed {
    Wave,
    Wind,
    Weather,
    Tides,
}

impl Feed {
    pub const ALL: [Feed; 4] = [Feed::Wave, Feed::Wind, Feed::Weather, Feed::Tides];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Wave => "wave",
            Feed::Wind => "wind",
            Feed::Weather => "weather",
            Feed::Tides => "tides",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecast horizon and sampling interval requested from the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub days: u8,
    pub interval_hours: u8,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            days: DEFAULT_DAYS,
            interval_hours: DEFAULT_INTERVAL_HOURS,
        }
    }
}

impl FetchOptions {
    pub fn interval_for(&self, feed: Feed) -> u8 {
        match feed {
            Feed::Tides => TIDES_INTERVAL_HOURS,
            _ => self.interval_hours,
        }
    }
}

/// Raw feed documents for one spot.
#[derive(Clone, Debug)]
pub struct SpotPayload {
    pub location: Location,
    pub wave: Value,
    pub wind: Value,
    pub weather: Value,
    pub tides: Value,
}

#[derive(Clone, Debug)]
pub struct SurflineClient {
    client: reqwest::Client,
    base_url: String,
}

impl SurflineClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EtlError::request(base_url, e))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        SurflineClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of a feed, without query string.
    ///
    /// Example: `https://services.surfline.com/kbyg/spots/forecasts/wave`
    pub fn feed_url(&self, feed: Feed) -> String {
        format!("{}/{}", self.base_url, feed)
    }

    pub fn query(spot_id: &str, feed: Feed, options: &FetchOptions) -> Vec<(&'static str, String)> {
        vec![
            ("spotId", spot_id.to_string()),
            ("days", options.days.to_string()),
            ("intervalHours", options.interval_for(feed).to_string()),
            ("sds", "true".to_string()),
        ]
    }

    /// Fetch one feed for one spot.
    ///
    /// Transport failures and non-2xx statuses are request errors; a body
    /// that is not JSON is a schema error.
    pub async fn fetch_feed(
        &self,
        location: &Location,
        feed: Feed,
        options: &FetchOptions,
    ) -> Result<Value> {
        let url = self.feed_url(feed);
        log::debug!(
            "Fetching {} forecast for {} ({})",
            feed,
            location.spot_name,
            location.spot_id
        );

        let response = self
            .client
            .get(&url)
            .query(&Self::query(&location.spot_id, feed, options))
            .send()
            .await
            .map_err(|e| EtlError::request(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::request(
                &url,
                format!("unexpected status {}", status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EtlError::request(&url, e))?;

        serde_json::from_slice(&body)
            .map_err(|e| EtlError::schema(&location.spot_id, feed.as_str(), e))
    }

    pub async fn fetch_spot(&self, location: &Location, options: &FetchOptions) -> Result<SpotPayload> {
        Ok(SpotPayload {
            location: location.clone(),
            wave: self.fetch_feed(location, Feed::Wave, options).await?,
            wind: self.fetch_feed(location, Feed::Wind, options).await?,
            weather: self.fetch_feed(location, Feed::Weather, options).await?,
            tides: self.fetch_feed(location, Feed::Tides, options).await?,
        })
    }

    /// Fetch every spot in order. The first failure aborts.
    pub async fn fetch_all(
        &self,
        spots: &[Location],
        options: &FetchOptions,
    ) -> Result<Vec<SpotPayload>> {
        let mut payloads = Vec::with_capacity(spots.len());
        for spot in spots {
            payloads.push(self.fetch_spot(spot, options).await?);
            log::info!("Fetched {} forecast feeds for {}", Feed::ALL.len(), spot.spot_name);
        }
        Ok(payloads)
    }
}
