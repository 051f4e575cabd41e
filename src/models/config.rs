// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP fetching behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// First-post candidate selection settings
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Visibility refresh settings
    #[serde(default)]
    pub visibility: VisibilityConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.base_url.trim().is_empty() {
            return Err(AppError::validation("fetcher.base_url is empty"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if !(0.0..=100.0).contains(&self.selection.percent) {
            return Err(AppError::validation(
                "selection.percent must be within 0..=100",
            ));
        }
        self.selection.weights.validate()?;
        if self.visibility.batch_limit == 0 {
            return Err(AppError::validation("visibility.batch_limit must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Forum base URL; topic pages live at `{base_url}/viewtopic.php?t=<id>`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Transient failures tolerated before a batch is aborted
    #[serde(default = "defaults::transient_failure_budget")]
    pub transient_failure_budget: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            transient_failure_budget: defaults::transient_failure_budget(),
        }
    }
}

/// Candidate-selection settings for the first-post check pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Percentage of the active population checked per cycle
    #[serde(default = "defaults::percent")]
    pub percent: f64,

    /// Per-criterion sampling quotas
    #[serde(default)]
    pub weights: SelectionWeights,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            percent: defaults::percent(),
            weights: SelectionWeights::default(),
        }
    }
}

/// Percentage quotas for the five ranking criteria.
///
/// Quotas are independent; they are not required to sum to 100, and rounding
/// may leave the realized sample smaller than requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionWeights {
    /// Freshest start time first
    #[serde(default = "defaults::weight")]
    pub start_time: f64,

    /// Oldest previous check first
    #[serde(default = "defaults::weight")]
    pub upd_time: f64,

    /// Most popular folders first
    #[serde(default = "defaults::weight")]
    pub folder_weight: f64,

    /// Fewest prior checks first
    #[serde(default = "defaults::weight")]
    pub checks_made: f64,

    /// Uniform random remainder
    #[serde(default = "defaults::weight")]
    pub random: f64,
}

impl SelectionWeights {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("start_time", self.start_time),
            ("upd_time", self.upd_time),
            ("folder_weight", self.folder_weight),
            ("checks_made", self.checks_made),
            ("random", self.random),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(AppError::validation(format!(
                    "selection.weights.{} must be within 0..=100",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            start_time: defaults::weight(),
            upd_time: defaults::weight(),
            folder_weight: defaults::weight(),
            checks_made: defaults::weight(),
            random: defaults::weight(),
        }
    }
}

/// Visibility refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityConfig {
    /// Upper bound of stale topics refreshed per cycle
    #[serde(default = "defaults::batch_limit")]
    pub batch_limit: usize,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            batch_limit: defaults::batch_limit(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://lizaalert.org/forum".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; topicwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn transient_failure_budget() -> u32 {
        3
    }
    pub fn percent() -> f64 {
        20.0
    }
    pub fn weight() -> f64 {
        20.0
    }
    pub fn batch_limit() -> usize {
        100
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.fetcher.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_weight() {
        let mut config = Config::default();
        config.selection.weights.random = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_limit() {
        let mut config = Config::default();
        config.visibility.batch_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [selection]
            percent = 10.0
            "#,
        )
        .unwrap();
        assert_eq!(config.selection.percent, 10.0);
        assert_eq!(config.selection.weights.random, 20.0);
        assert_eq!(config.fetcher.timeout_secs, 10);
        assert_eq!(config.visibility.batch_limit, 100);
    }
}
