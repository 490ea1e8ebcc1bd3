//! Stable usage model and payload normalization
//!
//! [`UsageSnapshot`] is the only entity the presentation layer should depend
//! on. It is built once per fetch cycle, immutable after construction, and
//! replaced wholesale on the next fetch.

pub mod client;
pub mod response;

pub use client::{UsageClient, UsageFetcher};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use response::{LegacyResponse, RawQuota, RawWindow, UsageResponse, WindowedResponse};

/// One rate-limit window, as a percentage of quota used.
///
/// Percentages above 100 mean over-quota and are preserved as-is; clamping
/// for display is the presentation layer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    pub used_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RateWindow {
    /// Human countdown to the reset, e.g. "2d 5h", "3h 12m", "45m", "now".
    pub fn reset_description(&self, now: DateTime<Utc>) -> Option<String> {
        let resets_at = self.resets_at?;
        let diff = resets_at.signed_duration_since(now);
        if diff <= chrono::Duration::zero() {
            return Some("now".to_string());
        }

        let hours = diff.num_hours();
        let minutes = diff.num_minutes() % 60;
        if hours > 24 {
            Some(format!("{}d {}h", hours / 24, hours % 24))
        } else if hours > 0 {
            Some(format!("{hours}h {minutes}m"))
        } else {
            Some(format!("{}m", diff.num_minutes().max(1)))
        }
    }
}

/// Paid extra-usage credits, reported by the windowed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCredits {
    pub used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_limit: Option<f64>,
}

/// Daily token quota, reported by the legacy shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuota {
    pub used_tokens: f64,
    pub token_limit: f64,
}

/// Auxiliary quota beyond the rate windows. Absent when the payload carries
/// no matching sub-object; absence is not a zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuxiliaryQuota {
    Credits(ExtraCredits),
    Daily(DailyQuota),
}

/// Immutable result of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Rolling session window (five-hour in the windowed shape).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<RateWindow>,
    /// Longer window: seven-day, or daily in the legacy shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<RateWindow>,
    /// Model-specific weekly window, Opus preferred over Sonnet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tertiary: Option<RateWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<AuxiliaryQuota>,
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn from_response(response: UsageResponse) -> Self {
        match response {
            UsageResponse::Windowed(windowed) => Self::from_windowed(windowed),
            UsageResponse::Legacy(legacy) => Self::from_legacy(legacy),
        }
    }

    fn from_windowed(response: WindowedResponse) -> Self {
        let primary = response
            .five_hour
            .as_ref()
            .map(|w| window(w, Some(300), "Session"));
        let secondary = response
            .seven_day
            .as_ref()
            .map(|w| window(w, Some(10_080), "Weekly"));
        let tertiary = response
            .seven_day_opus
            .or(response.seven_day_sonnet)
            .as_ref()
            .map(|w| window(w, Some(10_080), "Weekly (Model)"));

        let auxiliary = response.extra_usage.map(|extra| {
            AuxiliaryQuota::Credits(ExtraCredits {
                used: extra.used_credits.unwrap_or(0.0),
                monthly_limit: extra.monthly_limit,
            })
        });

        Self {
            primary,
            secondary,
            tertiary,
            auxiliary,
            fetched_at: Utc::now(),
        }
    }

    fn from_legacy(response: LegacyResponse) -> Self {
        let primary = response
            .session_usage
            .as_ref()
            .map(|q| quota_window(q, Some(300), "Session"));
        let secondary = response
            .daily_usage
            .as_ref()
            .map(|q| quota_window(q, Some(1_440), "Daily"));

        // Daily token figures double as the auxiliary quota when reported.
        let auxiliary = response.daily_usage.as_ref().and_then(|daily| {
            let limit = daily.tokens_limit.filter(|l| *l > 0.0)?;
            Some(AuxiliaryQuota::Daily(DailyQuota {
                used_tokens: daily.tokens.unwrap_or(0.0),
                token_limit: limit,
            }))
        });

        Self {
            primary,
            secondary,
            tertiary: None,
            auxiliary,
            fetched_at: Utc::now(),
        }
    }
}

fn window(raw: &RawWindow, window_minutes: Option<i32>, label: &str) -> RateWindow {
    RateWindow {
        used_percent: sanitize_percent(raw.utilization.unwrap_or(0.0)),
        window_minutes,
        resets_at: raw.resets_at.as_deref().and_then(parse_reset),
        label: Some(label.to_string()),
    }
}

fn quota_window(raw: &RawQuota, window_minutes: Option<i32>, label: &str) -> RateWindow {
    RateWindow {
        used_percent: quota_percent(raw),
        window_minutes,
        resets_at: raw.reset_at.as_deref().and_then(parse_reset),
        label: Some(label.to_string()),
    }
}

/// Percent used for a count-based quota. The token ratio wins over the
/// request ratio when both limits are positive; no positive limit means
/// "no data" and reads as zero.
fn quota_percent(raw: &RawQuota) -> f64 {
    let token_percent = ratio_percent(raw.tokens, raw.tokens_limit);
    let request_percent = ratio_percent(raw.requests, raw.requests_limit);
    sanitize_percent(token_percent.or(request_percent).unwrap_or(0.0))
}

fn ratio_percent(used: Option<f64>, limit: Option<f64>) -> Option<f64> {
    let limit = limit.filter(|l| *l > 0.0)?;
    Some(used.unwrap_or(0.0) / limit * 100.0)
}

/// Keep percentages finite and non-negative. Over-100 values pass through.
fn sanitize_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.max(0.0)
    } else {
        0.0
    }
}

/// ISO-8601 reset timestamp: the fractional-seconds form is attempted first,
/// then the plain form. Unparseable input is "no reset info", never an error.
pub(crate) fn parse_reset(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn snapshot(payload: serde_json::Value) -> UsageSnapshot {
        UsageSnapshot::from_response(UsageResponse::from_value(payload).unwrap())
    }

    #[test]
    fn test_windowed_payload_maps_session_and_weekly() {
        let snap = snapshot(json!({
            "five_hour": {"utilization": 42.0, "resets_at": "2025-06-01T00:00:00Z"},
            "seven_day": {"utilization": 73.5, "resets_at": "2025-06-07T00:00:00Z"}
        }));

        let primary = snap.primary.unwrap();
        assert_eq!(primary.used_percent, 42.0);
        assert_eq!(primary.window_minutes, Some(300));
        assert_eq!(
            primary.resets_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(snap.secondary.unwrap().used_percent, 73.5);
        assert!(snap.tertiary.is_none());
        assert!(snap.auxiliary.is_none());
    }

    #[test]
    fn test_opus_window_preferred_over_sonnet() {
        let snap = snapshot(json!({
            "five_hour": {"utilization": 1.0},
            "seven_day_opus": {"utilization": 88.0},
            "seven_day_sonnet": {"utilization": 12.0}
        }));
        assert_eq!(snap.tertiary.unwrap().used_percent, 88.0);
    }

    #[test]
    fn test_extra_usage_maps_to_credits() {
        let snap = snapshot(json!({
            "five_hour": {"utilization": 0.0},
            "extra_usage": {"is_enabled": true, "used_credits": 12.5, "monthly_limit": 50.0}
        }));
        assert_eq!(
            snap.auxiliary,
            Some(AuxiliaryQuota::Credits(ExtraCredits {
                used: 12.5,
                monthly_limit: Some(50.0),
            }))
        );
    }

    #[test]
    fn test_legacy_scenario_tokens_preferred() {
        let snap = snapshot(json!({
            "session_usage": {
                "requests": 10,
                "requests_limit": 100,
                "tokens": 500,
                "tokens_limit": 1000,
                "reset_at": "2025-06-01T00:00:00Z"
            }
        }));

        let primary = snap.primary.unwrap();
        assert!((primary.used_percent - 50.0).abs() < 1e-9);
        assert_eq!(
            primary.resets_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert!(snap.secondary.is_none());
    }

    #[test]
    fn test_legacy_requests_used_when_no_token_limit() {
        let snap = snapshot(json!({
            "session_usage": {"requests": 25, "requests_limit": 100, "tokens_limit": 0}
        }));
        assert!((snap.primary.unwrap().used_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_both_limits_zero_is_no_data() {
        let snap = snapshot(json!({
            "session_usage": {"requests": 5, "requests_limit": 0, "tokens": 9, "tokens_limit": 0}
        }));
        assert_eq!(snap.primary.unwrap().used_percent, 0.0);
        assert!(snap.auxiliary.is_none());
    }

    #[test]
    fn test_legacy_daily_usage_populates_quota_and_window() {
        let snap = snapshot(json!({
            "daily_usage": {"tokens": 8000, "tokens_limit": 10000, "reset_at": "2025-06-02T00:00:00Z"}
        }));
        assert!((snap.secondary.as_ref().unwrap().used_percent - 80.0).abs() < 1e-9);
        assert_eq!(
            snap.auxiliary,
            Some(AuxiliaryQuota::Daily(DailyQuota {
                used_tokens: 8000.0,
                token_limit: 10000.0,
            }))
        );
    }

    #[test]
    fn test_over_quota_percent_not_clamped() {
        let snap = snapshot(json!({
            "five_hour": {"utilization": 131.2, "resets_at": null}
        }));
        assert_eq!(snap.primary.unwrap().used_percent, 131.2);
    }

    #[test]
    fn test_negative_utilization_sanitized_to_zero() {
        let snap = snapshot(json!({
            "five_hour": {"utilization": -3.0}
        }));
        assert_eq!(snap.primary.unwrap().used_percent, 0.0);
    }

    #[test]
    fn test_absent_optionals_yield_absent_fields() {
        let snap = snapshot(json!({
            "five_hour": null,
            "seven_day": null
        }));
        assert!(snap.primary.is_none());
        assert!(snap.secondary.is_none());
        assert!(snap.tertiary.is_none());
        assert!(snap.auxiliary.is_none());
    }

    #[test]
    fn test_parse_reset_with_and_without_fractional_seconds() {
        let fractional = parse_reset("2025-01-01T00:00:00.123Z").unwrap();
        let plain = parse_reset("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(plain, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(fractional.signed_duration_since(plain).num_milliseconds(), 123);
    }

    #[test]
    fn test_parse_reset_malformed_is_none() {
        assert!(parse_reset("not-a-date").is_none());
        assert!(parse_reset("").is_none());
    }

    #[test]
    fn test_reset_description_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let window = |resets_at| RateWindow {
            used_percent: 0.0,
            window_minutes: None,
            resets_at: Some(resets_at),
            label: None,
        };

        let in_days = window(Utc.with_ymd_and_hms(2025, 6, 4, 2, 0, 0).unwrap());
        assert_eq!(in_days.reset_description(now).unwrap(), "3d 2h");

        let in_hours = window(Utc.with_ymd_and_hms(2025, 6, 1, 3, 12, 0).unwrap());
        assert_eq!(in_hours.reset_description(now).unwrap(), "3h 12m");

        let in_minutes = window(Utc.with_ymd_and_hms(2025, 6, 1, 0, 45, 0).unwrap());
        assert_eq!(in_minutes.reset_description(now).unwrap(), "45m");

        let past = window(Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap());
        assert_eq!(past.reset_description(now).unwrap(), "now");
    }

    #[test]
    fn test_reset_description_none_without_timestamp() {
        let window = RateWindow {
            used_percent: 10.0,
            window_minutes: Some(300),
            resets_at: None,
            label: Some("Session".to_string()),
        };
        assert!(window.reset_description(Utc::now()).is_none());
    }
}
