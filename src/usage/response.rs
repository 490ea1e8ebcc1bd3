//! Raw response shapes for the OAuth usage endpoint
//!
//! The endpoint has shipped at least two incompatible payload layouts. Shape
//! detection is explicit: classify by top-level keys, then deserialize the
//! matching layout. Unknown and extra fields are ignored so newer API
//! revisions keep decoding.

use serde::Deserialize;
use serde_json::Value;

/// Current layout, keyed by named time windows.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WindowedResponse {
    pub five_hour: Option<RawWindow>,
    pub seven_day: Option<RawWindow>,
    #[serde(default)]
    pub seven_day_opus: Option<RawWindow>,
    #[serde(default)]
    pub seven_day_sonnet: Option<RawWindow>,
    #[serde(default)]
    pub extra_usage: Option<RawExtraUsage>,
}

#[derive(Debug, Deserialize)]
pub struct RawWindow {
    /// Already a 0-100 percentage, not a fraction.
    pub utilization: Option<f64>,
    pub resets_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RawExtraUsage {
    pub is_enabled: Option<bool>,
    pub monthly_limit: Option<f64>,
    pub used_credits: Option<f64>,
    pub utilization: Option<f64>,
}

/// Older layout, keyed by request/token counts against limits.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LegacyResponse {
    pub session_usage: Option<RawQuota>,
    pub daily_usage: Option<RawQuota>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RawQuota {
    pub requests: Option<f64>,
    pub requests_limit: Option<f64>,
    pub tokens: Option<f64>,
    pub tokens_limit: Option<f64>,
    pub reset_at: Option<String>,
}

/// Decoded payload, tagged by which layout matched.
#[derive(Debug)]
pub enum UsageResponse {
    Windowed(WindowedResponse),
    Legacy(LegacyResponse),
}

const WINDOWED_KEYS: [&str; 5] = [
    "five_hour",
    "seven_day",
    "seven_day_opus",
    "seven_day_sonnet",
    "extra_usage",
];
const LEGACY_KEYS: [&str; 2] = ["session_usage", "daily_usage"];

impl UsageResponse {
    /// Classify a decoded JSON document. A document matching neither layout
    /// is a decode failure, never a crash.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Some(map) = value.as_object() else {
            return Err("usage payload is not a JSON object".to_string());
        };

        if WINDOWED_KEYS.iter().any(|key| map.contains_key(*key)) {
            let decoded = serde_json::from_value(value).map_err(|e| e.to_string())?;
            return Ok(Self::Windowed(decoded));
        }

        if LEGACY_KEYS.iter().any(|key| map.contains_key(*key)) {
            let decoded = serde_json::from_value(value).map_err(|e| e.to_string())?;
            return Ok(Self::Legacy(decoded));
        }

        Err("usage payload matches no known response shape".to_string())
    }
}
