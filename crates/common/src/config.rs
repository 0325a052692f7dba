//! Bot configuration types.

use serde::{Deserialize, Serialize};

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Base URL of the Sataako forecast service (no trailing slash).
    #[serde(default)]
    pub server_url: String,

    /// Polling and request timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// How forecast times are shown to users.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Rain map passthrough settings.
    #[serde(default)]
    pub rain_map: RainMapConfig,
}

/// Timing configuration (all values in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Rain warning polling interval per conversation.
    #[serde(default = "default_query_interval")]
    pub query_interval_secs: u64,

    /// Upper bound for a single forecast service request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Presentation of forecast timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA zone that ETAs are converted into (e.g., "Europe/Helsinki").
    #[serde(default = "default_display_timezone")]
    pub timezone: String,

    /// strftime pattern for ETAs shown in warnings.
    #[serde(default = "default_eta_format")]
    pub eta_format: String,
}

/// Rain map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RainMapConfig {
    /// Image endpoint used when the rain map itself is unavailable.
    #[serde(default = "default_fallback_image_url")]
    pub fallback_image_url: String,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_query_interval() -> u64 {
    120
}
fn default_request_timeout() -> u64 {
    5
}

fn default_display_timezone() -> String {
    "Europe/Helsinki".into()
}
fn default_eta_format() -> String {
    "%H:%M".into()
}

fn default_fallback_image_url() -> String {
    "http://thecatapi.com/api/images/get?format=src&type=gif".into()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            query_interval_secs: default_query_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_display_timezone(),
            eta_format: default_eta_format(),
        }
    }
}

impl Default for RainMapConfig {
    fn default() -> Self {
        Self {
            fallback_image_url: default_fallback_image_url(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            timing: TimingConfig::default(),
            display: DisplayConfig::default(),
            rain_map: RainMapConfig::default(),
        }
    }
}
