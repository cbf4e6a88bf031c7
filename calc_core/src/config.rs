//! # Calculator Configuration
//!
//! [`CalculatorConfig`] holds the limits the engine applies to input and
//! results. It is fixed at construction and replaced field by field through
//! [`ConfigUpdate`]. Values are not range-checked: a negative `max_digits`
//! simply truncates input hard, and the engine keeps working.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::config::{CalculatorConfig, ConfigUpdate};
//!
//! let mut config = CalculatorConfig::default();
//! assert_eq!(config.max_digits, 12);
//!
//! config.apply(&ConfigUpdate { decimal_places: Some(2), ..Default::default() });
//! assert_eq!(config.decimal_places, 2);
//! assert_eq!(config.max_digits, 12);
//!
//! // Missing fields fall back to their defaults
//! let loaded = CalculatorConfig::from_json(r#"{ "enable_history": false }"#).unwrap();
//! assert!(!loaded.enable_history);
//! assert_eq!(loaded.decimal_places, 8);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Maximum number of retained history entries
pub const HISTORY_LIMIT: usize = 50;

/// Engine limits and feature switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Display truncation ceiling, in characters
    pub max_digits: i64,

    /// Rounding precision applied to every computed result
    pub decimal_places: i64,

    /// Record completed operations in the history
    pub enable_history: bool,

    /// Forward engine events to the injected logger
    pub enable_logging: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig {
            max_digits: 12,
            decimal_places: 8,
            enable_history: true,
            enable_logging: true,
        }
    }
}

impl CalculatorConfig {
    /// Merge the fields present in `update` into this config.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(max_digits) = update.max_digits {
            self.max_digits = max_digits;
        }
        if let Some(decimal_places) = update.decimal_places {
            self.decimal_places = decimal_places;
        }
        if let Some(enable_history) = update.enable_history {
            self.enable_history = enable_history;
        }
        if let Some(enable_logging) = update.enable_logging {
            self.enable_logging = enable_logging;
        }
    }

    /// Display length the engine enforces; at least one character survives.
    pub fn display_limit(&self) -> usize {
        usize::try_from(self.max_digits).unwrap_or(0).max(1)
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CalcResult<Self> {
        serde_json::from_str(json).map_err(|e| CalcError::serialization(format!("Invalid config: {}", e)))
    }
}

/// Load a config file.
pub fn load_config(path: &Path) -> CalcResult<CalculatorConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read config", path.display().to_string(), e.to_string()))?;
    CalculatorConfig::from_json(&contents)
}

/// Partial config; `None` fields are left unchanged by [`CalculatorConfig::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_digits: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_logging: Option<bool>,
}

impl ConfigUpdate {
    /// Build an update from a `key=value` pair, as typed at the CLI.
    ///
    /// Keys accept both `snake_case` and `camelCase` spellings.
    pub fn from_pair(key: &str, value: &str) -> CalcResult<Self> {
        let invalid = |reason: &str| CalcError::invalid_input(key, value, reason);
        let mut update = ConfigUpdate::default();

        match key {
            "max_digits" | "maxDigits" => {
                update.max_digits = Some(value.parse().map_err(|_| invalid("Expected an integer"))?);
            }
            "decimal_places" | "decimalPlaces" => {
                update.decimal_places = Some(value.parse().map_err(|_| invalid("Expected an integer"))?);
            }
            "enable_history" | "enableHistory" => {
                update.enable_history = Some(parse_bool(value).ok_or_else(|| invalid("Expected true or false"))?);
            }
            "enable_logging" | "enableLogging" => {
                update.enable_logging = Some(parse_bool(value).ok_or_else(|| invalid("Expected true or false"))?);
            }
            _ => return Err(invalid("Unknown config key")),
        }

        Ok(update)
    }

    pub fn is_empty(&self) -> bool {
        self == &ConfigUpdate::default()
    }
}

impl From<CalculatorConfig> for ConfigUpdate {
    fn from(config: CalculatorConfig) -> Self {
        ConfigUpdate {
            max_digits: Some(config.max_digits),
            decimal_places: Some(config.decimal_places),
            enable_history: Some(config.enable_history),
            enable_logging: Some(config.enable_logging),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalculatorConfig::default();
        assert_eq!(config.max_digits, 12);
        assert_eq!(config.decimal_places, 8);
        assert!(config.enable_history);
        assert!(config.enable_logging);
    }

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut config = CalculatorConfig::default();
        config.apply(&ConfigUpdate {
            max_digits: Some(4),
            enable_logging: Some(false),
            ..Default::default()
        });
        assert_eq!(config.max_digits, 4);
        assert_eq!(config.decimal_places, 8);
        assert!(config.enable_history);
        assert!(!config.enable_logging);
    }

    #[test]
    fn test_display_limit_never_below_one() {
        let mut config = CalculatorConfig::default();
        config.max_digits = -3;
        assert_eq!(config.display_limit(), 1);
        config.max_digits = 0;
        assert_eq!(config.display_limit(), 1);
        config.max_digits = 5;
        assert_eq!(config.display_limit(), 5);
    }

    #[test]
    fn test_from_json_partial_and_invalid() {
        let config = CalculatorConfig::from_json(r#"{ "max_digits": 6 }"#).unwrap();
        assert_eq!(config.max_digits, 6);
        assert_eq!(config.decimal_places, 8);

        let err = CalculatorConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_update_from_pair() {
        let update = ConfigUpdate::from_pair("decimalPlaces", "2").unwrap();
        assert_eq!(update.decimal_places, Some(2));

        let update = ConfigUpdate::from_pair("enable_history", "off").unwrap();
        assert_eq!(update.enable_history, Some(false));

        assert!(ConfigUpdate::from_pair("max_digits", "many").is_err());
        assert!(ConfigUpdate::from_pair("theme", "dark").is_err());
        assert!(ConfigUpdate::default().is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let path = std::env::temp_dir().join("calc_core_test_missing_config.json");
        let _ = fs::remove_file(&path);
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
