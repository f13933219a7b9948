//! Locker settings parsed from the key-value settings store

use marquee_common::db::{
    KEY_LOCKER_BACKDROP_OPACITY, KEY_LOCKER_ENABLED, KEY_LOCKER_HEIGHT, KEY_LOCKER_HTML,
    KEY_LOCKER_WIDTH, KEY_MIN_DURATION, KEY_ONLY_DIRECT_VIDEOS, KEY_SKIP_IF_NO_DURATION,
    KEY_TRIGGER_PERCENTAGE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Effective locker configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockerSettings {
    pub enabled: bool,
    /// Always within [0, 100]. 0 fires on the first playback tick.
    pub trigger_percentage: f64,
    /// Skip the locker when the source plays in an iframe embed
    pub only_direct_videos: bool,
    pub skip_if_no_duration: bool,
    /// Only consulted when `skip_if_no_duration` is set
    pub min_duration_seconds: i64,
    pub width_px: u32,
    pub height_px: u32,
    /// Within [0, 1]
    pub backdrop_opacity: f64,
    /// Operator-supplied unlock document
    pub unlock_html: String,
}

impl Default for LockerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger_percentage: 20.0,
            only_direct_videos: false,
            skip_if_no_duration: false,
            min_duration_seconds: 0,
            width_px: 640,
            height_px: 480,
            backdrop_opacity: 0.85,
            unlock_html: String::new(),
        }
    }
}

/// Parse a boolean setting. Accepts true/false, 1/0, yes/no, on/off.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_or(values: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match values.get(key) {
        Some(raw) => parse_bool(raw).unwrap_or_else(|| {
            warn!("Setting {}={:?} is not a boolean, using default ({})", key, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_or<T>(values: &HashMap<String, String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match values.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Setting {}={:?} is not valid, using default ({})", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Clamp to [0, 100]; NaN becomes 0
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl LockerSettings {
    /// Build from raw store values. Missing or malformed keys use defaults.
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let raw_percentage: f64 =
            parse_or(values, KEY_TRIGGER_PERCENTAGE, defaults.trigger_percentage);
        let trigger_percentage = if raw_percentage.is_finite() {
            clamp_percentage(raw_percentage)
        } else {
            warn!(
                "Setting {} is not finite, using default ({})",
                KEY_TRIGGER_PERCENTAGE, defaults.trigger_percentage
            );
            defaults.trigger_percentage
        };

        let opacity: f64 = parse_or(values, KEY_LOCKER_BACKDROP_OPACITY, defaults.backdrop_opacity);
        let backdrop_opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            defaults.backdrop_opacity
        };

        Self {
            enabled: bool_or(values, KEY_LOCKER_ENABLED, defaults.enabled),
            trigger_percentage,
            only_direct_videos: bool_or(values, KEY_ONLY_DIRECT_VIDEOS, defaults.only_direct_videos),
            skip_if_no_duration: bool_or(
                values,
                KEY_SKIP_IF_NO_DURATION,
                defaults.skip_if_no_duration,
            ),
            min_duration_seconds: parse_or(values, KEY_MIN_DURATION, defaults.min_duration_seconds)
                .max(0),
            width_px: parse_or(values, KEY_LOCKER_WIDTH, defaults.width_px),
            height_px: parse_or(values, KEY_LOCKER_HEIGHT, defaults.height_px),
            backdrop_opacity,
            unlock_html: values.get(KEY_LOCKER_HTML).cloned().unwrap_or_default(),
        }
    }
}

/// Partial update submitted by an operator. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockerSettingsUpdate {
    pub enabled: Option<bool>,
    pub trigger_percentage: Option<f64>,
    pub only_direct_videos: Option<bool>,
    pub skip_if_no_duration: Option<bool>,
    pub min_duration_seconds: Option<i64>,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub backdrop_opacity: Option<f64>,
    pub unlock_html: Option<String>,
}

impl LockerSettingsUpdate {
    /// Store key/value pairs for the fields present.
    ///
    /// Percentage is clamped rather than rejected; non-finite numbers and
    /// negative durations are rejected.
    pub fn to_pairs(&self) -> Result<Vec<(&'static str, String)>, String> {
        let mut pairs = Vec::new();

        if let Some(v) = self.enabled {
            pairs.push((KEY_LOCKER_ENABLED, v.to_string()));
        }
        if let Some(v) = self.trigger_percentage {
            if !v.is_finite() {
                return Err("trigger_percentage must be a finite number".to_string());
            }
            pairs.push((KEY_TRIGGER_PERCENTAGE, clamp_percentage(v).to_string()));
        }
        if let Some(v) = self.only_direct_videos {
            pairs.push((KEY_ONLY_DIRECT_VIDEOS, v.to_string()));
        }
        if let Some(v) = self.skip_if_no_duration {
            pairs.push((KEY_SKIP_IF_NO_DURATION, v.to_string()));
        }
        if let Some(v) = self.min_duration_seconds {
            if v < 0 {
                return Err("min_duration_seconds must not be negative".to_string());
            }
            pairs.push((KEY_MIN_DURATION, v.to_string()));
        }
        if let Some(v) = self.width_px {
            pairs.push((KEY_LOCKER_WIDTH, v.to_string()));
        }
        if let Some(v) = self.height_px {
            pairs.push((KEY_LOCKER_HEIGHT, v.to_string()));
        }
        if let Some(v) = self.backdrop_opacity {
            if !v.is_finite() {
                return Err("backdrop_opacity must be a finite number".to_string());
            }
            pairs.push((KEY_LOCKER_BACKDROP_OPACITY, v.clamp(0.0, 1.0).to_string()));
        }
        if let Some(v) = &self.unlock_html {
            pairs.push((KEY_LOCKER_HTML, v.clone()));
        }

        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_common::db::LOCKER_SETTING_DEFAULTS;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_store_gives_defaults() {
        assert_eq!(LockerSettings::from_values(&HashMap::new()), LockerSettings::default());
    }

    #[test]
    fn test_seeded_defaults_match_struct_defaults() {
        let seeded = values(LOCKER_SETTING_DEFAULTS);
        assert_eq!(LockerSettings::from_values(&seeded), LockerSettings::default());
    }

    #[test]
    fn test_percentage_is_clamped() {
        let s = LockerSettings::from_values(&values(&[(KEY_TRIGGER_PERCENTAGE, "250")]));
        assert_eq!(s.trigger_percentage, 100.0);
        let s = LockerSettings::from_values(&values(&[(KEY_TRIGGER_PERCENTAGE, "-5")]));
        assert_eq!(s.trigger_percentage, 0.0);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let s = LockerSettings::from_values(&values(&[
            (KEY_TRIGGER_PERCENTAGE, "twenty"),
            (KEY_LOCKER_ENABLED, "maybe"),
            (KEY_MIN_DURATION, "1.5"),
            (KEY_LOCKER_WIDTH, "-1"),
        ]));
        assert_eq!(s.trigger_percentage, 20.0);
        assert!(s.enabled);
        assert_eq!(s.min_duration_seconds, 0);
        assert_eq!(s.width_px, 640);
    }

    #[test]
    fn test_non_finite_percentage_uses_default() {
        let s = LockerSettings::from_values(&values(&[(KEY_TRIGGER_PERCENTAGE, "NaN")]));
        assert_eq!(s.trigger_percentage, 20.0);
        let s = LockerSettings::from_values(&values(&[(KEY_TRIGGER_PERCENTAGE, "inf")]));
        assert_eq!(s.trigger_percentage, 20.0);
    }

    #[test]
    fn test_bool_spellings() {
        for raw in ["true", "TRUE", "1", "yes", "On"] {
            assert_eq!(parse_bool(raw), Some(true), "{}", raw);
        }
        for raw in ["false", "0", "No", "off "] {
            assert_eq!(parse_bool(raw), Some(false), "{}", raw);
        }
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_full_parse() {
        let s = LockerSettings::from_values(&values(&[
            (KEY_LOCKER_ENABLED, "false"),
            (KEY_TRIGGER_PERCENTAGE, "35.5"),
            (KEY_ONLY_DIRECT_VIDEOS, "true"),
            (KEY_SKIP_IF_NO_DURATION, "1"),
            (KEY_MIN_DURATION, "30"),
            (KEY_LOCKER_BACKDROP_OPACITY, "3"),
            (KEY_LOCKER_HTML, "<p>unlock</p>"),
        ]));
        assert!(!s.enabled);
        assert_eq!(s.trigger_percentage, 35.5);
        assert!(s.only_direct_videos);
        assert!(s.skip_if_no_duration);
        assert_eq!(s.min_duration_seconds, 30);
        assert_eq!(s.backdrop_opacity, 1.0);
        assert_eq!(s.unlock_html, "<p>unlock</p>");
    }

    #[test]
    fn test_update_pairs_only_present_fields() {
        let update = LockerSettingsUpdate {
            trigger_percentage: Some(140.0),
            skip_if_no_duration: Some(true),
            ..Default::default()
        };
        let pairs = update.to_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                (KEY_TRIGGER_PERCENTAGE, "100".to_string()),
                (KEY_SKIP_IF_NO_DURATION, "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_rejects_negative_min_duration() {
        let update = LockerSettingsUpdate {
            min_duration_seconds: Some(-1),
            ..Default::default()
        };
        assert!(update.to_pairs().is_err());
    }
}
