//! Optimizer configuration and persistence.

use crate::allocation::{
    AllocationConfig, MissingMetricPolicy, DEFAULT_HIGH_RISK_WEIGHT_CAP,
    DEFAULT_VOLATILITY_CAP_FACTOR,
};
use crate::metrics::DEFAULT_RISK_FREE_RATE;
use crate::provider::{YahooPriceSource, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::types::Horizon;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_FILE_ENV: &str = "OPTIMIZER_CONFIG_FILE";

/// User configuration, stored as TOML.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Annual risk-free rate used in the Sharpe ratio
    pub risk_free_rate: f64,
    /// Horizon label whose metrics drive the allocation
    pub horizon: String,
    /// Volatility multiple of the average that marks a ticker as high risk
    pub volatility_cap_factor: f64,
    /// Weight ceiling for high-risk tickers
    pub high_risk_weight_cap: f64,
    /// Handling of tickers with unavailable metrics
    pub missing_metrics: MissingMetricPolicy,
    /// Market data host
    pub base_url: String,
    /// User agent sent to the market data host
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            horizon: "1y".to_string(),
            volatility_cap_factor: DEFAULT_VOLATILITY_CAP_FACTOR,
            high_risk_weight_cap: DEFAULT_HIGH_RISK_WEIGHT_CAP,
            missing_metrics: MissingMetricPolicy::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.portfolio-optimizer/config.toml`
    /// Can be overridden with `OPTIMIZER_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_FILE_ENV) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".portfolio-optimizer/config.toml"))
            .unwrap_or_else(|| PathBuf::from("optimizer.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config to `path`, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the horizon label, the rate and the allocation parameters.
    pub fn validate(&self) -> Result<()> {
        self.horizon()?;
        self.allocation().validate()?;

        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidInput(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }

        Ok(())
    }

    /// The configured allocation horizon.
    pub fn horizon(&self) -> Result<Horizon> {
        Horizon::from_label(&self.horizon)
            .ok_or_else(|| Error::UnknownHorizon(self.horizon.clone()))
    }

    /// Allocation parameters derived from this config.
    pub fn allocation(&self) -> AllocationConfig {
        AllocationConfig {
            volatility_cap_factor: self.volatility_cap_factor,
            high_risk_weight_cap: self.high_risk_weight_cap,
            missing_metrics: self.missing_metrics,
        }
    }

    /// Yahoo price source for the configured host.
    pub fn price_source(&self) -> Result<YahooPriceSource> {
        YahooPriceSource::new(&self.base_url, &self.user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = Config {
            risk_free_rate: 0.045,
            horizon: "5y".to_string(),
            missing_metrics: MissingMetricPolicy::Neutral,
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.horizon().unwrap().days, 1825);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "volatility_cap_factor = 1.5\nmissing_metrics = \"reject\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.volatility_cap_factor, 1.5);
        assert_eq!(config.missing_metrics, MissingMetricPolicy::Reject);
        assert_eq!(config.horizon, "1y");
        assert_eq!(config.allocation().high_risk_weight_cap, 0.15);
    }

    #[test]
    fn test_unknown_horizon_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "horizon = \"10y\"\n").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(result, Err(Error::UnknownHorizon(_))));
    }

    #[test]
    fn test_horizon_lookup() {
        let mut config = Config::default();
        assert_eq!(config.horizon().unwrap().days, 365);

        config.horizon = "6M".to_string();
        assert_eq!(config.horizon().unwrap().days, 180);

        config.horizon = "2y".to_string();
        assert!(matches!(config.horizon(), Err(Error::UnknownHorizon(h)) if h == "2y"));
    }

    #[test]
    fn test_invalid_cap_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "high_risk_weight_cap = 1.5\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "risk_free_rate = \"high\"\n").unwrap();

        assert!(matches!(
            Config::load_from_path(&path),
            Err(Error::TomlDe(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");

        // Only this test touches the variable
        env::set_var(CONFIG_FILE_ENV, &path);
        let resolved = Config::default_path();
        env::remove_var(CONFIG_FILE_ENV);

        assert_eq!(resolved, path);
    }
}
