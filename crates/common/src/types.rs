//! Domain types shared across the bot.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Conversations ─────────────────────────────────────────────────────

/// Opaque identifier of one user's ongoing session with the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered coordinate. Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ── Forecast service payloads ─────────────────────────────────────────

/// Response body of `GET /forecast/{lon}/{lat}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDocument {
    /// Per-timestep records in chronological order.
    pub forecasts: Vec<ForecastRecord>,
    /// Expected accumulation over the forecast window, in millimetres.
    #[serde(default)]
    pub accumulation: f64,
    /// strftime pattern the `time` fields are written in.
    pub time_format: String,
    /// IANA zone the `time` fields are expressed in.
    pub timezone: String,
}

/// One forecast timestep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub time: String,
    pub rain_intensity: f64,
}

impl ForecastRecord {
    pub fn is_wet(&self) -> bool {
        self.rain_intensity > 0.0
    }
}

/// Derived rain assessment for a location at tick time.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastJudgement {
    /// `None` when the forecast carried no timesteps.
    pub is_raining: Option<bool>,
    /// Local display time of the next wet/dry change, if one is forecast.
    pub change_eta: Option<String>,
    pub accumulation_mm: f64,
}

impl ForecastJudgement {
    /// Dry right now with a change to wet on the horizon.
    pub fn about_to_rain(&self) -> bool {
        self.is_raining == Some(false) && self.change_eta.is_some()
    }

    pub fn is_raining_now(&self) -> bool {
        self.is_raining == Some(true)
    }
}

// ── Outgoing content ──────────────────────────────────────────────────

/// Content delivered to a conversation. Formatting beyond plain text is
/// left to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Text(String),
    Location(Location),
    Image { url: String },
    Menu(Vec<String>),
    ServiceUnavailable,
    ServiceRecovered,
    RainWarning {
        change_eta: String,
        accumulation_mm: f64,
    },
    NoRainExpected,
}

impl Notification {
    pub fn text(message: impl Into<String>) -> Self {
        Notification::Text(message.into())
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Text(message) => write!(f, "{message}"),
            Notification::Location(loc) => {
                write!(f, "📍 {:.4}, {:.4}", loc.latitude, loc.longitude)
            }
            Notification::Image { url } => write!(f, "{url}"),
            Notification::Menu(options) => {
                write!(f, "Choose your next action.")?;
                for option in options {
                    write!(f, "\n  • {option}")?;
                }
                Ok(())
            }
            Notification::ServiceUnavailable => write!(
                f,
                "The rain forecast service is currently unavailable. \
                 I'll keep trying and let you know when it's back."
            ),
            Notification::ServiceRecovered => {
                write!(f, "The rain forecast service is back online.")
            }
            Notification::RainWarning {
                change_eta,
                accumulation_mm,
            } => write!(
                f,
                "Warning! Rain is expected to start at {change_eta}. \
                 Expected accumulation is {accumulation_mm:.1} mm."
            ),
            Notification::NoRainExpected => write!(
                f,
                "No rain expected in the near future. I'll warn you if that changes."
            ),
        }
    }
}
