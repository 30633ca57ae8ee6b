//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching pairlab.toml.
//! Every section is optional; missing sections take their defaults.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::CorrelationMethod;
use crate::strategy::{BacktestParams, KalmanConfig, DEFAULT_FALLBACK_THETA};

/// Environment variable overriding `data.prices_file`
pub const PRICES_FILE_ENV: &str = "PAIRLAB_PRICES_FILE";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure matching pairlab.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub synthetic: SyntheticSection,
    #[serde(default)]
    pub screen: ScreenSection,
    #[serde(default)]
    pub kalman: KalmanConfig,
    #[serde(default)]
    pub backtest: BacktestParams,
    #[serde(default)]
    pub mean_reversion: MeanReversionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Price source section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSection {
    /// Wide CSV of closes (Date column plus one column per ticker)
    #[serde(default)]
    pub prices_file: Option<String>,
}

impl DataSection {
    /// Prices file with environment variable override and `~` expansion
    /// Checks PAIRLAB_PRICES_FILE env var first, falls back to config value
    pub fn get_prices_file(&self) -> Option<String> {
        resolve_prices_file(self.prices_file.as_deref(), std::env::var(PRICES_FILE_ENV).ok())
    }
}

fn resolve_prices_file(configured: Option<&str>, env_value: Option<String>) -> Option<String> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .map(|path| shellexpand::tilde(&path).to_string())
}

/// Seeded random-walk universe used by `--synthetic`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyntheticSection {
    pub seed: u64,
    pub tickers: usize,
    /// Business days generated, ending at `end_date`
    pub days: usize,
    /// Last generated date (YYYY-MM-DD); defaults to 2024-12-31
    pub end_date: Option<String>,
}

impl Default for SyntheticSection {
    fn default() -> Self {
        Self {
            seed: 42,
            tickers: 8,
            days: 504,
            end_date: None,
        }
    }
}

/// Pair screen section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreenSection {
    /// Default correlation method for `pairs`
    pub method: CorrelationMethod,
    /// Number of pairs returned
    pub top_n: usize,
    /// Fan Kalman pairs out across threads
    pub parallel: bool,
}

impl Default for ScreenSection {
    fn default() -> Self {
        Self {
            method: CorrelationMethod::Pearson,
            top_n: 10,
            parallel: true,
        }
    }
}

/// Mean-reversion estimator section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeanReversionSection {
    /// Speed reported when the spread regression is degenerate
    pub fallback_theta: f64,
}

impl Default for MeanReversionSection {
    fn default() -> Self {
        Self {
            fallback_theta: DEFAULT_FALLBACK_THETA,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "screen.top_n must be > 0".to_string(),
            ));
        }

        self.kalman
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("kalman: {}", e)))?;

        self.backtest
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("backtest: {}", e)))?;

        if !self.mean_reversion.fallback_theta.is_finite() {
            return Err(ConfigError::ValidationError(format!(
                "mean_reversion.fallback_theta must be finite, got {}",
                self.mean_reversion.fallback_theta
            )));
        }

        if self.synthetic.tickers < 2 {
            return Err(ConfigError::ValidationError(format!(
                "synthetic.tickers must be >= 2, got {}",
                self.synthetic.tickers
            )));
        }

        if self.synthetic.days < 2 {
            return Err(ConfigError::ValidationError(format!(
                "synthetic.days must be >= 2, got {}",
                self.synthetic.days
            )));
        }

        if let Some(end) = &self.synthetic.end_date {
            if chrono::NaiveDate::parse_from_str(end, "%Y-%m-%d").is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "synthetic.end_date must be YYYY-MM-DD, got '{}'",
                    end
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}
