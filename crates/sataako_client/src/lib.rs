//! Sataako forecast service client.
//!
//! Fetches the per-location rain forecast document from
//! `{server}/forecast/{lon}/{lat}` and rejects anything the interpreter
//! could not safely read. Also exposes the best-effort rain map lookup.

pub mod rain_map;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use common::{Error, ForecastDocument, Location};
use tracing::debug;

pub use rain_map::{RainMap, RainMapClient};

const USER_AGENT: &str = "sataako-bot/0.1";

/// HTTP client for the forecast endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: reqwest::Client,
    server_url: String,
}

impl ForecastClient {
    /// Build a client with an explicit per-request bound.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn forecast_url(&self, location: &Location) -> String {
        format!(
            "{}/forecast/{}/{}",
            self.server_url, location.longitude, location.latitude
        )
    }

    /// Fetch and validate the forecast for a coordinate. One request, no
    /// retries.
    pub async fn fetch(&self, location: &Location) -> Result<ForecastDocument, Error> {
        let url = self.forecast_url(location);
        debug!("Fetching rain forecast: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("GET {url}: {e}")))?;

        let status = resp.status().as_u16();
        debug!("Forecast response returned with status {}", status);
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::MalformedResponse(format!(
                "forecast service returned {} for {}: {}",
                status,
                url,
                &body[..floor_char_boundary(&body, 500)]
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("reading body of {url}: {e}")))?;
        let doc: ForecastDocument = serde_json::from_slice(&body)
            .map_err(|e| Error::MalformedResponse(format!("JSON parse error for {url}: {e}")))?;

        validate_document(&doc)?;
        debug!(
            "Got {} forecast steps for ({}, {})",
            doc.forecasts.len(),
            location.latitude,
            location.longitude
        );
        Ok(doc)
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut idx = s.len().min(max);
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Resolve an IANA zone name such as `Europe/Helsinki` or `UTC`.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    Tz::from_str(name.trim()).ok()
}

/// Parse one record timestamp written in `time_format`, interpreted in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
pub fn parse_record_time(raw: &str, time_format: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), time_format).ok()?;
    tz.from_local_datetime(&naive).earliest()
}

/// Reject documents the interpreter cannot read: unknown zone, timestamps
/// that do not match the stated format, or negative/non-finite amounts.
pub fn validate_document(doc: &ForecastDocument) -> Result<(), Error> {
    let tz = parse_timezone(&doc.timezone).ok_or_else(|| {
        Error::MalformedResponse(format!("unknown timezone {:?}", doc.timezone))
    })?;

    if !doc.accumulation.is_finite() || doc.accumulation < 0.0 {
        return Err(Error::MalformedResponse(format!(
            "accumulation must be a number >= 0, got {}",
            doc.accumulation
        )));
    }

    for (idx, record) in doc.forecasts.iter().enumerate() {
        if !record.rain_intensity.is_finite() || record.rain_intensity < 0.0 {
            return Err(Error::MalformedResponse(format!(
                "forecast[{idx}].rain_intensity must be a number >= 0, got {}",
                record.rain_intensity
            )));
        }
        if parse_record_time(&record.time, &doc.time_format, &tz).is_none() {
            return Err(Error::MalformedResponse(format!(
                "forecast[{idx}].time {:?} does not match format {:?}",
                record.time, doc.time_format
            )));
        }
    }

    Ok(())
}
