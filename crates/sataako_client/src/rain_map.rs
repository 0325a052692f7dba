//! Rain map passthrough.
//!
//! The service renders a precomputed radar animation at `{server}/rainmap`.
//! Lookups never fail: when the map is missing we fall back to a random
//! cat gif, and when that is missing too only an apology is returned.

use std::time::Duration;

use chrono::Utc;
use common::Error;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::build_http_client;

pub const MAP_CAPTION: &str = "Here is the current rain map.";
pub const FALLBACK_CAPTION: &str =
    "Sorry! We couldn't fetch a picture of the rain map but here is a picture of a cat instead.";
pub const UNAVAILABLE_CAPTION: &str = "Sorry, we couldn't fetch the image of the rain map.";

/// Result of a rain map lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RainMap {
    pub image_url: Option<String>,
    pub caption: String,
}

#[derive(Debug, Clone)]
pub struct RainMapClient {
    client: reqwest::Client,
    map_url: String,
    fallback_url: String,
}

impl RainMapClient {
    pub fn new(server_url: &str, fallback_url: &str, timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
            map_url: format!("{}/rainmap", server_url.trim_end_matches('/')),
            fallback_url: fallback_url.to_string(),
        })
    }

    pub async fn get_rain_map(&self) -> RainMap {
        if self.map_is_available().await {
            info!("Rain map available");
            return RainMap {
                image_url: Some(format!("{}/{}", self.map_url, Utc::now().timestamp())),
                caption: MAP_CAPTION.into(),
            };
        }

        info!("No rain map available, trying fallback image");
        if let Some(url) = self.fallback_image_url().await {
            return RainMap {
                image_url: Some(url),
                caption: FALLBACK_CAPTION.into(),
            };
        }

        info!("No fallback image available either");
        RainMap {
            image_url: None,
            caption: UNAVAILABLE_CAPTION.into(),
        }
    }

    async fn map_is_available(&self) -> bool {
        match self.client.get(&self.map_url).send().await {
            Ok(resp) => resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.contains("image/gif")),
            Err(e) => {
                debug!("Rain map request failed: {}", e);
                false
            }
        }
    }

    /// Final URL after redirects, so the transport can link the image
    /// directly.
    async fn fallback_image_url(&self) -> Option<String> {
        match self.client.get(&self.fallback_url).send().await {
            Ok(resp) if resp.status().is_success() => Some(resp.url().to_string()),
            Ok(resp) => {
                debug!("Fallback image returned {}", resp.status());
                None
            }
            Err(e) => {
                debug!("Fallback image request failed: {}", e);
                None
            }
        }
    }
}
