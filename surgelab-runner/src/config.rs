//! Runner configuration, loaded from TOML.
//!
//! Every section and field has a default, so an empty file is a valid
//! config. `validate` rejects values that would make a run meaningless.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use surgelab_core::patterns::MiningParams;
use surgelab_core::scoring::GradeThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Upper bounds keep derived durations far from overflow.
pub const MAX_FETCH_INTERVAL_MS: u64 = 60_000;
pub const MAX_BREAKER_COOLDOWN_SECS: u64 = 24 * 60 * 60;
pub const MAX_TTL_HOURS: u64 = 365 * 24;

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurgeLabConfig {
    pub fetch: FetchConfig,
    pub scoring: GradeThresholds,
    pub mining: MiningConfig,
    pub smart_mining: SmartMiningConfig,
    pub dna: DnaConfig,
    pub backtest: BacktestConfig,
    pub cache: CacheConfig,
}

impl SurgeLabConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_in_flight == 0 {
            return Err(invalid("fetch.max_in_flight", "must be at least 1"));
        }
        if self.fetch.interval_ms > MAX_FETCH_INTERVAL_MS {
            return Err(invalid(
                "fetch.interval_ms",
                format!("must be at most {MAX_FETCH_INTERVAL_MS}"),
            ));
        }
        if self.fetch.breaker_cooldown_secs > MAX_BREAKER_COOLDOWN_SECS {
            return Err(invalid(
                "fetch.breaker_cooldown_secs",
                format!("must be at most {MAX_BREAKER_COOLDOWN_SECS}"),
            ));
        }
        if !self.scoring.is_valid() {
            return Err(invalid(
                "scoring",
                "grade thresholds must descend strictly inside (0, 100]",
            ));
        }
        for (field, params) in [
            ("mining.params", &self.mining.params),
            ("smart_mining.params", &self.smart_mining.params),
        ] {
            if params.top_k == 0 {
                return Err(invalid(field, "top_k must be at least 1"));
            }
            if params.min_corpus_size == 0 {
                return Err(invalid(field, "min_corpus_size must be at least 1"));
            }
        }
        if self.mining.holding_days == 0 {
            return Err(invalid("mining.holding_days", "must be at least 1"));
        }
        if self.smart_mining.surge_window_days == 0 {
            return Err(invalid("smart_mining.surge_window_days", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.smart_mining.pullback_threshold) {
            return Err(invalid("smart_mining.pullback_threshold", "must be within [0, 100]"));
        }
        if self.dna.window_bars == 0 {
            return Err(invalid("dna.window_bars", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.dna.min_score) {
            return Err(invalid("dna.min_score", "must be within [0, 100]"));
        }
        if self.backtest.holding_days == 0 {
            return Err(invalid("backtest.holding_days", "must be at least 1"));
        }
        if let Some(rate) = self.backtest.stop_loss_rate {
            if rate.is_nan() || rate >= 0.0 {
                return Err(invalid("backtest.stop_loss_rate", "must be negative"));
            }
        }
        if self.cache.ttl_hours == 0 {
            return Err(invalid("cache.ttl_hours", "must be at least 1"));
        }
        if self.cache.ttl_hours > MAX_TTL_HOURS {
            return Err(invalid(
                "cache.ttl_hours",
                format!("must be at most {MAX_TTL_HOURS}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Minimum spacing between provider calls.
    pub interval_ms: u64,
    pub max_in_flight: usize,
    pub breaker_cooldown_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_in_flight: 4,
            breaker_cooldown_secs: 30 * 60,
        }
    }
}

impl FetchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_secs(self.breaker_cooldown_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Symbols sampled from the universe per run.
    pub sample_size: usize,
    pub history_days: usize,
    /// Trailing bars scanned for a qualifying surge.
    pub lookback_days: usize,
    /// One-day return (percent) that qualifies as a surge.
    pub min_return: f64,
    /// Forward-return horizon measured from the signal bar.
    pub holding_days: usize,
    pub seed: u64,
    pub max_events: Option<usize>,
    pub time_budget_secs: Option<u64>,
    pub params: MiningParams,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            sample_size: 200,
            history_days: 120,
            lookback_days: 60,
            min_return: 15.0,
            holding_days: 1,
            seed: 42,
            max_events: None,
            time_budget_secs: None,
            params: MiningParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartMiningConfig {
    pub markets: Vec<String>,
    pub ranking_limit: usize,
    /// Names containing any of these (case-insensitive) are not equities.
    pub excluded_name_keywords: Vec<String>,
    pub history_days: usize,
    pub surge_window_days: usize,
    /// Window return (percent) required in phase 2.
    pub surge_threshold: f64,
    /// High-to-current pullback (percent) that drops a candidate in phase 3.
    pub pullback_threshold: f64,
    pub params: MiningParams,
}

impl Default for SmartMiningConfig {
    fn default() -> Self {
        Self {
            markets: vec!["KOSPI".into(), "KOSDAQ".into()],
            ranking_limit: 100,
            excluded_name_keywords: ["ETF", "ETN", "FUND", "NOTE", "REIT", "SPAC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            history_days: 120,
            surge_window_days: 10,
            surge_threshold: 30.0,
            pullback_threshold: 20.0,
            params: MiningParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnaConfig {
    /// Bars fetched per exemplar; must reach back past the exemplar window.
    pub history_days: usize,
    /// Recent bars forming a candidate's window when scanning.
    pub window_bars: usize,
    pub use_investor_flows: bool,
    pub min_score: f64,
}

impl Default for DnaConfig {
    fn default() -> Self {
        Self {
            history_days: 500,
            window_bars: 20,
            use_investor_flows: true,
            min_score: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub history_days: usize,
    /// Entry is evaluated this many bars before the latest bar.
    pub days_ago: usize,
    pub holding_days: usize,
    /// Percent, e.g. `-7.0`. `None` disables the stop.
    pub stop_loss_rate: Option<f64>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            history_days: 120,
            days_ago: 20,
            holding_days: 5,
            stop_loss_rate: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_hours: u64,
    /// Directory for the JSON pattern/DNA store. `None` runs without persistence.
    pub store_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            store_dir: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours.saturating_mul(60 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = SurgeLabConfig::from_toml_str("").unwrap();
        assert_eq!(config, SurgeLabConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SurgeLabConfig::from_toml_str(
            r#"
            [fetch]
            max_in_flight = 8

            [mining]
            min_return = 20.0

            [mining.params]
            top_k = 3

            [backtest]
            stop_loss_rate = -7.0
            "#,
        )
        .unwrap();
        assert_eq!(config.fetch.max_in_flight, 8);
        assert_eq!(config.fetch.interval_ms, 100);
        assert_eq!(config.mining.min_return, 20.0);
        assert_eq!(config.mining.params.top_k, 3);
        assert_eq!(config.mining.params.min_samples, 2);
        assert_eq!(config.backtest.stop_loss_rate, Some(-7.0));
    }

    #[test]
    fn rejects_zero_pool() {
        let err = SurgeLabConfig::from_toml_str("[fetch]\nmax_in_flight = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "fetch.max_in_flight",
                ..
            }
        ));
    }

    #[test]
    fn rejects_oversized_durations() {
        let err = SurgeLabConfig::from_toml_str("[cache]\nttl_hours = 100000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cache.ttl_hours", .. }));

        let err = SurgeLabConfig::from_toml_str("[fetch]\ninterval_ms = 600000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "fetch.interval_ms", .. }));

        let huge = CacheConfig {
            ttl_hours: u64::MAX,
            store_dir: None,
        };
        assert_eq!(huge.ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn rejects_positive_stop_loss() {
        let err = SurgeLabConfig::from_toml_str("[backtest]\nstop_loss_rate = 5.0\n").unwrap_err();
        assert!(err.to_string().contains("stop_loss_rate"));
    }

    #[test]
    fn rejects_unordered_grades() {
        let err = SurgeLabConfig::from_toml_str(
            "[scoring]\ns = 40.0\na = 58.0\nb = 42.0\nc = 25.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scoring", .. }));
    }

    #[test]
    fn parse_errors_are_tagged() {
        let err = SurgeLabConfig::from_toml_str("[fetch\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = SurgeLabConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(SurgeLabConfig::from_toml_str(&text).unwrap(), config);
    }
}
