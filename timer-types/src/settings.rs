//! User settings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{PuzzleType, TypesError};

/// WCA inspection ceiling in seconds.
pub const DEFAULT_INSPECTION_SECS: u32 = 15;

/// User preferences.
///
/// Settings have no relational constraints and are always replaced as a
/// whole value, locally and remotely. `inspectionEnabled` and
/// `inspectionTime` are required on the wire; everything else falls back to
/// its default when missing or of an unexpected shape, so payloads written by
/// older or newer clients still parse. A fractional `inspectionTime` is
/// rounded to whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Run a countdown before the timer starts
    pub inspection_enabled: bool,
    /// Inspection ceiling in seconds
    #[serde(deserialize_with = "whole_seconds")]
    pub inspection_time: u32,
    /// Display three decimals instead of two
    #[serde(default = "default_true", deserialize_with = "true_unless_false")]
    pub show_milliseconds: bool,
    /// Selected puzzle
    #[serde(default)]
    pub cube_type: PuzzleType,
    /// Which statistics rows are shown
    #[serde(default, deserialize_with = "or_default")]
    pub visible_stats: VisibleStats,
    /// Color theme
    #[serde(default, deserialize_with = "or_default")]
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inspection_enabled: false,
            inspection_time: DEFAULT_INSPECTION_SECS,
            show_milliseconds: true,
            cube_type: PuzzleType::default(),
            visible_stats: VisibleStats::default(),
            theme: Theme::default(),
        }
    }
}

/// Visibility flags for the statistics rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibleStats {
    /// Best single
    pub best: bool,
    /// Worst single
    pub worst: bool,
    /// Average of 5
    pub ao5: bool,
    /// Average of 12
    pub ao12: bool,
    /// Session mean
    pub mean: bool,
}

impl Default for VisibleStats {
    fn default() -> Self {
        Self {
            best: true,
            worst: true,
            ao5: true,
            ao12: true,
            mean: true,
        }
    }
}

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark background
    #[default]
    Dark,
    /// Light background
    Light,
    /// Follow the host preference
    Auto,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for Theme {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "auto" => Ok(Theme::Auto),
            _ => Err(TypesError::UnknownTheme(s.to_string())),
        }
    }
}

fn default_true() -> bool {
    true
}

fn whole_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() {
        return Ok(DEFAULT_INSPECTION_SECS);
    }
    Ok(secs.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn true_unless_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(true))
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wca_inspection() {
        let settings = Settings::default();
        assert!(!settings.inspection_enabled);
        assert_eq!(settings.inspection_time, 15);
        assert!(settings.show_milliseconds);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn minimal_legacy_payload_fills_defaults() {
        let json = r#"{"inspectionEnabled": true, "inspectionTime": 15}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.inspection_enabled);
        assert_eq!(settings.cube_type, PuzzleType::ThreeByThree);
        assert_eq!(settings.visible_stats, VisibleStats::default());
    }

    #[test]
    fn required_fields_are_enforced() {
        let json = r#"{"inspectionEnabled": true}"#;
        assert!(serde_json::from_str::<Settings>(json).is_err());
    }

    #[test]
    fn partial_visible_stats_default_missing_flags() {
        let json = r#"{
            "inspectionEnabled": false,
            "inspectionTime": 15,
            "visibleStats": {"worst": false}
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(!settings.visible_stats.worst);
        assert!(settings.visible_stats.best);
    }

    #[test]
    fn fractional_inspection_time_rounds() {
        let json = r#"{"inspectionEnabled": true, "inspectionTime": 15.5}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.inspection_time, 16);

        let json = r#"{"inspectionEnabled": true, "inspectionTime": -3}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.inspection_time, 0);
    }

    #[test]
    fn unexpected_optional_values_fall_back() {
        let json = r#"{
            "inspectionEnabled": false,
            "inspectionTime": 15,
            "showMilliseconds": "yes",
            "cubeType": "fto",
            "visibleStats": [true],
            "theme": "neon"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.show_milliseconds);
        assert_eq!(settings.cube_type, PuzzleType::ThreeByThree);
        assert_eq!(settings.visible_stats, VisibleStats::default());
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn theme_parses() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("neon".parse::<Theme>().is_err());
    }
}
