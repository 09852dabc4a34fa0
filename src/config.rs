//! Tap configuration
//!
//! The configuration file is a flat JSON object. `access_token` and
//! `start_date` are required; everything else tunes the HTTP client.

use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::types::OptionStringExt;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Keys that must be present (and non-empty) in every config file
pub const REQUIRED_CONFIG_KEYS: [&str; 2] = ["access_token", "start_date"];

/// Runtime configuration for a sync or discover run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API token sent as a bearer token
    #[serde(default)]
    pub access_token: String,

    /// Start of the extraction window. The API offers no date filtering,
    /// so this is validated and carried but never used to filter.
    #[serde(default)]
    pub start_date: String,

    /// Override for the User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Optional client-side request rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    300
}

impl Config {
    /// Create a config with the two required settings
    pub fn new(access_token: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            start_date: start_date.into(),
            user_agent: None,
            requests_per_second: None,
            request_timeout_seconds: default_timeout(),
        }
    }

    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required keys and value formats
    pub fn validate(&self) -> Result<()> {
        if self.access_token.clone().none_if_empty().is_none() {
            return Err(Error::missing_field(REQUIRED_CONFIG_KEYS[0]));
        }
        if self.start_date.clone().none_if_empty().is_none() {
            return Err(Error::missing_field(REQUIRED_CONFIG_KEYS[1]));
        }
        if !is_valid_start_date(&self.start_date) {
            return Err(Error::invalid_value(
                "start_date",
                format!(
                    "'{}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date",
                    self.start_date
                ),
            ));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Build the HTTP client configuration for this run
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .bearer_token(&self.access_token)
            .timeout(Duration::from_secs(self.request_timeout_seconds));

        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }
        if let Some(rps) = self.requests_per_second {
            builder = builder.requests_per_second(rps);
        }

        builder.build()
    }
}

fn is_valid_start_date(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config =
            Config::from_json(r#"{"access_token": "tok", "start_date": "2020-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.start_date, "2020-01-01T00:00:00Z");
        assert_eq!(config.request_timeout_seconds, 300);
        assert!(config.requests_per_second.is_none());
    }

    #[test]
    fn test_missing_access_token() {
        let err = Config::from_json(r#"{"start_date": "2020-01-01"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "access_token"));
    }

    #[test]
    fn test_empty_start_date_is_missing() {
        let err = Config::from_json(r#"{"access_token": "tok", "start_date": ""}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { ref field } if field == "start_date"));
    }

    #[test]
    fn test_invalid_start_date() {
        let err =
            Config::from_json(r#"{"access_token": "tok", "start_date": "last tuesday"}"#)
                .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "start_date"));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let err = Config::from_json(
            r#"{"access_token": "tok", "start_date": "2020-01-01", "requests_per_second": 0}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"access_token": "abc", "start_date": "2021-06-01", "requests_per_second": 5}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.access_token, "abc");
        assert_eq!(config.requests_per_second, Some(5));
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/config.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_http_client_config() {
        let mut config = Config::new("secret", "2020-01-01");
        config.user_agent = Some("acme-etl/2.0".to_string());
        config.requests_per_second = Some(4);

        let http = config.http_client_config();
        assert_eq!(http.bearer_token.as_deref(), Some("secret"));
        assert_eq!(http.user_agent, "acme-etl/2.0");
        assert_eq!(http.timeout, Duration::from_secs(300));
        assert_eq!(http.requests_per_second.map(std::num::NonZeroU32::get), Some(4));
    }
}
