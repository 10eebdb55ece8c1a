//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` is empty or contains whitespace
    /// - `scope` is not an absolute http(s) URL, or is itself bypassed
    /// - `assets` is empty, has a blank entry, or names a bypassed URL
    /// - a bypass pattern is blank
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if `assets` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(invalid("version", "must not be empty"));
        }
        if self.version.chars().any(char::is_whitespace) {
            return Err(invalid("version", "must not contain whitespace"));
        }

        let scope = Url::parse(&self.scope).map_err(|e| invalid("scope", e.to_string()))?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(invalid("scope", format!("unsupported scheme: {}", scope.scheme())));
        }

        if let Some(pattern) = self.bypass_patterns.iter().find(|p| p.trim().is_empty()) {
            return Err(invalid("bypass_patterns", format!("blank pattern {pattern:?} would bypass every request")));
        }
        if let Some(pattern) = self.bypass_patterns.iter().find(|p| self.scope.contains(p.as_str())) {
            return Err(invalid("scope", format!("scope is bypassed by pattern {pattern:?}")));
        }

        if self.assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "assets".into(),
                hint: "list at least one path or URL to cache at install".into(),
            });
        }
        for asset in &self.assets {
            if asset.trim().is_empty() {
                return Err(invalid("assets", "entries must not be blank"));
            }
            if let Some(pattern) = self.bypass_patterns.iter().find(|p| asset.contains(p.as_str())) {
                return Err(invalid("assets", format!("{asset} is bypassed by pattern {pattern:?}")));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.bypass_patterns.is_empty() {
            tracing::debug!("no bypass patterns configured; every request is intercepted");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: AppConfig, expected: &str) {
        let result = config.validate();
        assert!(
            matches!(&result, Err(ConfigError::Invalid { field, .. }) if field == expected),
            "expected invalid {expected}, got {result:?}"
        );
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        assert_invalid(AppConfig { version: "  ".into(), ..Default::default() }, "version");
        assert_invalid(AppConfig { version: "v 2".into(), ..Default::default() }, "version");
    }

    #[test]
    fn test_validate_scope() {
        assert_invalid(AppConfig { scope: "not a url".into(), ..Default::default() }, "scope");
        assert_invalid(AppConfig { scope: "file:///srv/app/".into(), ..Default::default() }, "scope");
        assert_invalid(AppConfig { scope: "https://app.firebaseio.com/".into(), ..Default::default() }, "scope");
    }

    #[test]
    fn test_validate_empty_assets() {
        let config = AppConfig { assets: Vec::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "assets"));
    }

    #[test]
    fn test_validate_blank_asset() {
        assert_invalid(AppConfig { assets: vec!["./".into(), " ".into()], ..Default::default() }, "assets");
    }

    #[test]
    fn test_validate_bypassed_asset() {
        let config = AppConfig {
            assets: vec!["./".into(), "https://fonts.googleapis.com/icon?family=Material+Icons".into()],
            ..Default::default()
        };
        assert_invalid(config, "assets");
    }

    #[test]
    fn test_validate_blank_bypass_pattern() {
        assert_invalid(AppConfig { bypass_patterns: vec![String::new()], ..Default::default() }, "bypass_patterns");
    }

    #[test]
    fn test_validate_no_bypass_patterns_ok() {
        let config = AppConfig { bypass_patterns: Vec::new(), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes() {
        assert_invalid(AppConfig { max_bytes: 0, ..Default::default() }, "max_bytes");
        assert_invalid(AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }, "max_bytes");
    }

    #[test]
    fn test_validate_timeout() {
        assert_invalid(AppConfig { timeout_ms: 50, ..Default::default() }, "timeout_ms");
        assert_invalid(AppConfig { timeout_ms: 301_000, ..Default::default() }, "timeout_ms");
    }

    #[test]
    fn test_validate_empty_user_agent() {
        assert_invalid(AppConfig { user_agent: String::new(), ..Default::default() }, "user_agent");
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { max_bytes: 1, timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
        let config = AppConfig { max_bytes: 50 * 1024 * 1024, timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
