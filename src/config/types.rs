//! Configuration types for p4-protections
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::{Deserialize, Serialize};

use crate::protections::AccessMode;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Filtering defaults
    pub filter: FilterConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Filtering defaults, overridable per invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Whether the Perforce server compares paths case-sensitively
    pub case_sensitive: bool,

    /// Mode candidates must reach to be kept
    pub required_mode: AccessMode,

    /// How the protections table is supplied
    pub rules_format: RulesFormat,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            required_mode: AccessMode::Read,
            rules_format: RulesFormat::Lines,
        }
    }
}

/// Input format of a protections table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesFormat {
    /// One raw `protects` line per line
    #[default]
    Lines,
    /// JSON array of tagged records (`p4 -ztag -Mj protects`)
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.filter.case_sensitive);
        assert_eq!(config.filter.required_mode, AccessMode::Read);
        assert_eq!(config.filter.rules_format, RulesFormat::Lines);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_rules_format() {
        let format: RulesFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, RulesFormat::Json);

        let format: RulesFormat = serde_json::from_str(r#""lines""#).unwrap();
        assert_eq!(format, RulesFormat::Lines);
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn test_serialize_to_toml() {
        let rendered = toml::to_string(&AppConfig::default()).unwrap();
        assert!(rendered.contains("[filter]"));
        assert!(rendered.contains("required_mode = \"read\""));
        assert!(rendered.contains("case_sensitive = true"));
    }
}
