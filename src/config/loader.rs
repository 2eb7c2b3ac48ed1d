//! Configuration loader.
//!
//! Loads and validates the TOML configuration. Secrets (API keys) can
//! come from the file or from environment variables; env always wins.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::application::{OrchestratorConfig, ScheduleConfig, SessionProfile};
use crate::domain::cycle::CycleMode;
use crate::domain::risk::RiskLimits;
use crate::scanner::ScannerConfig;
use crate::strategy::GeneratorConfig;

/// Main configuration structure matching config.toml.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerSection,
    pub signals: SignalsSection,
    pub risk: RiskSection,
    pub schedule: ScheduleSection,
    pub market_data: MarketDataSection,
    pub news: NewsSection,
    pub broker: BrokerSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    /// Symbols to scan. Empty means the built-in universe.
    pub universe: Vec<String>,
    pub min_catalyst_score: f64,
    pub catalyst_top_n: usize,
    pub final_top_n: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub min_avg_volume: f64,
    pub bar_lookback: usize,
    pub cache_ttl_seconds: u64,
}

impl Default for ScannerSection {
    fn default() -> Self {
        let d = ScannerConfig::default();
        Self {
            universe: Vec::new(),
            min_catalyst_score: d.min_catalyst_score,
            catalyst_top_n: d.catalyst_top_n,
            final_top_n: d.final_top_n,
            min_price: d.min_price,
            max_price: d.max_price,
            min_avg_volume: d.min_avg_volume,
            bar_lookback: d.bar_lookback,
            cache_ttl_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalsSection {
    /// Blended confidence below this is always a Hold.
    pub hold_threshold: f64,
    pub base_stop_pct: f64,
    pub entry_offset_pct: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalsSection {
    fn default() -> Self {
        let d = GeneratorConfig::default();
        Self {
            hold_threshold: d.hold_threshold,
            base_stop_pct: d.base_stop_pct,
            entry_offset_pct: d.entry_offset_pct,
            rsi_oversold: d.rsi_oversold,
            rsi_overbought: d.rsi_overbought,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub max_open_positions: usize,
    pub max_daily_loss_pct: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub pre_market_cap_pct: f64,
    pub regular_cap_pct: f64,
    /// Zero disables the time stop.
    pub max_holding_minutes: i64,
}

impl Default for RiskSection {
    fn default() -> Self {
        let d = RiskLimits::default();
        Self {
            max_open_positions: d.max_open_positions,
            max_daily_loss_pct: d.max_daily_loss_pct,
            min_price: d.min_price,
            max_price: d.max_price,
            pre_market_cap_pct: d.pre_market_cap_pct,
            regular_cap_pct: d.regular_cap_pct,
            max_holding_minutes: d.max_holding_minutes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    pub pre_market_enabled: bool,
    pub pre_market_interval_minutes: u64,
    pub regular_enabled: bool,
    pub regular_interval_minutes: u64,
    pub after_hours_enabled: bool,
    pub after_hours_interval_minutes: u64,
    /// Exchange offset from UTC, hours. Eastern is -4 in summer.
    pub utc_offset_hours: i64,
    pub poll_seconds: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            pre_market_enabled: true,
            pre_market_interval_minutes: 5,
            regular_enabled: true,
            regular_interval_minutes: 30,
            after_hours_enabled: true,
            after_hours_interval_minutes: 60,
            utc_offset_hours: -4,
            poll_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataSection {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8801".to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

impl MarketDataSection {
    pub fn get_api_key(&self) -> Option<String> {
        env_or(&self.api_key, "MARKET_DATA_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSection {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    /// Headline lookback per symbol, hours.
    pub window_hours: i64,
}

impl Default for NewsSection {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8802".to_string(),
            api_key: None,
            timeout_seconds: 10,
            window_hours: 24,
        }
    }
}

impl NewsSection {
    pub fn get_api_key(&self) -> Option<String> {
        env_or(&self.api_key, "NEWS_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerSection {
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8803".to_string(),
            api_key: None,
            timeout_seconds: 15,
        }
    }
}

impl BrokerSection {
    pub fn get_api_key(&self) -> Option<String> {
        env_or(&self.api_key, "BROKER_API_KEY")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory for the open-trade snapshot. Empty disables persistence.
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { data_dir: "data".to_string() }
    }
}

fn env_or(configured: &Option<String>, var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => configured.clone().filter(|k| !k.is_empty()),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.min_price <= 0.0 || self.scanner.min_price >= self.scanner.max_price {
            return Err(ConfigError::ValidationError(format!(
                "scanner price band must satisfy 0 < min < max, got [{}, {}]",
                self.scanner.min_price, self.scanner.max_price
            )));
        }
        if !(0.0..=1.0).contains(&self.scanner.min_catalyst_score) {
            return Err(ConfigError::ValidationError(format!(
                "min_catalyst_score must be 0-1, got {}",
                self.scanner.min_catalyst_score
            )));
        }
        if self.scanner.final_top_n == 0 || self.scanner.final_top_n > self.scanner.catalyst_top_n {
            return Err(ConfigError::ValidationError(format!(
                "final_top_n must be 1..=catalyst_top_n, got {} (top_n {})",
                self.scanner.final_top_n, self.scanner.catalyst_top_n
            )));
        }

        if !(0.0..=100.0).contains(&self.signals.hold_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "hold_threshold must be 0-100, got {}",
                self.signals.hold_threshold
            )));
        }
        if self.signals.base_stop_pct <= 0.0 || self.signals.base_stop_pct > 50.0 {
            return Err(ConfigError::ValidationError(format!(
                "base_stop_pct must be 0-50, got {}",
                self.signals.base_stop_pct
            )));
        }
        if self.signals.rsi_oversold >= self.signals.rsi_overbought {
            return Err(ConfigError::ValidationError(format!(
                "rsi_oversold must be below rsi_overbought, got {} >= {}",
                self.signals.rsi_oversold, self.signals.rsi_overbought
            )));
        }

        if self.risk.max_open_positions == 0 {
            return Err(ConfigError::ValidationError(
                "max_open_positions must be > 0".to_string(),
            ));
        }
        if self.risk.max_daily_loss_pct <= 0.0 || self.risk.max_daily_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_daily_loss_pct must be 0-100, got {}",
                self.risk.max_daily_loss_pct
            )));
        }
        for (name, pct) in [
            ("pre_market_cap_pct", self.risk.pre_market_cap_pct),
            ("regular_cap_pct", self.risk.regular_cap_pct),
        ] {
            if pct <= 0.0 || pct > 100.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be 0-100, got {}",
                    name, pct
                )));
            }
        }

        for (name, minutes) in [
            ("pre_market_interval_minutes", self.schedule.pre_market_interval_minutes),
            ("regular_interval_minutes", self.schedule.regular_interval_minutes),
            ("after_hours_interval_minutes", self.schedule.after_hours_interval_minutes),
        ] {
            if minutes == 0 {
                return Err(ConfigError::ValidationError(format!("{} must be > 0", name)));
            }
        }
        if self.schedule.poll_seconds == 0 {
            return Err(ConfigError::ValidationError("poll_seconds must be > 0".to_string()));
        }

        Ok(())
    }

    pub fn universe(&self) -> Vec<String> {
        if self.scanner.universe.is_empty() {
            crate::scanner::DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
        } else {
            self.scanner.universe.clone()
        }
    }
}

impl From<&Config> for ScannerConfig {
    fn from(config: &Config) -> Self {
        ScannerConfig {
            min_catalyst_score: config.scanner.min_catalyst_score,
            catalyst_top_n: config.scanner.catalyst_top_n,
            final_top_n: config.scanner.final_top_n,
            min_price: config.scanner.min_price,
            max_price: config.scanner.max_price,
            min_avg_volume: config.scanner.min_avg_volume,
            bar_lookback: config.scanner.bar_lookback,
        }
    }
}

impl From<&Config> for GeneratorConfig {
    fn from(config: &Config) -> Self {
        GeneratorConfig {
            hold_threshold: config.signals.hold_threshold,
            base_stop_pct: config.signals.base_stop_pct,
            entry_offset_pct: config.signals.entry_offset_pct,
            rsi_oversold: config.signals.rsi_oversold,
            rsi_overbought: config.signals.rsi_overbought,
            ..GeneratorConfig::default()
        }
    }
}

impl From<&Config> for RiskLimits {
    fn from(config: &Config) -> Self {
        RiskLimits {
            max_open_positions: config.risk.max_open_positions,
            max_daily_loss_pct: config.risk.max_daily_loss_pct,
            min_price: config.risk.min_price,
            max_price: config.risk.max_price,
            pre_market_cap_pct: config.risk.pre_market_cap_pct,
            regular_cap_pct: config.risk.regular_cap_pct,
            max_holding_minutes: config.risk.max_holding_minutes,
        }
    }
}

impl From<&Config> for ScheduleConfig {
    fn from(config: &Config) -> Self {
        ScheduleConfig {
            pre_market: SessionProfile {
                enabled: config.schedule.pre_market_enabled,
                interval_minutes: config.schedule.pre_market_interval_minutes,
                mode: CycleMode::Aggressive,
            },
            regular: SessionProfile {
                enabled: config.schedule.regular_enabled,
                interval_minutes: config.schedule.regular_interval_minutes,
                mode: CycleMode::Normal,
            },
            after_hours: SessionProfile {
                enabled: config.schedule.after_hours_enabled,
                interval_minutes: config.schedule.after_hours_interval_minutes,
                mode: CycleMode::Light,
            },
            utc_offset_hours: config.schedule.utc_offset_hours,
            poll_seconds: config.schedule.poll_seconds,
        }
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        OrchestratorConfig {
            universe: config.universe(),
            news_window_hours: config.news.window_hours,
            utc_offset_hours: config.schedule.utc_offset_hours,
            scan_cache_ttl_seconds: config.scanner.cache_ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config() -> String {
        r#"
[scanner]
universe = ["AAPL", "MSFT", "NVDA"]
min_catalyst_score = 0.3
catalyst_top_n = 20
final_top_n = 5
min_price = 5.0
max_price = 500.0
min_avg_volume = 100000.0
bar_lookback = 60
cache_ttl_seconds = 300

[signals]
hold_threshold = 30.0
base_stop_pct = 2.0
entry_offset_pct = 0.1
rsi_oversold = 30.0
rsi_overbought = 70.0

[risk]
max_open_positions = 5
max_daily_loss_pct = 5.0
min_price = 1.0
max_price = 10000.0
pre_market_cap_pct = 10.0
regular_cap_pct = 20.0
max_holding_minutes = 0

[schedule]
pre_market_enabled = true
pre_market_interval_minutes = 5
regular_enabled = true
regular_interval_minutes = 30
after_hours_enabled = true
after_hours_interval_minutes = 60
utc_offset_hours = -4
poll_seconds = 15

[market_data]
api_url = "http://localhost:8801"
timeout_seconds = 10

[news]
api_url = "http://localhost:8802"
timeout_seconds = 10
window_hours = 24

[broker]
api_url = "http://localhost:8803"
timeout_seconds = 15

[storage]
data_dir = "data"
"#
        .to_string()
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_temp(&valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scanner.final_top_n, 5);
        assert_eq!(config.universe(), vec!["AAPL", "MSFT", "NVDA"]);
        assert_eq!(config.schedule.pre_market_interval_minutes, 5);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = write_temp("[storage]\ndata_dir = \"tmp\"\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.storage.data_dir, "tmp");
        assert_eq!(config.risk.max_open_positions, 5);
        assert_eq!(config.universe().len(), 100);
    }

    #[test]
    fn test_invalid_price_band_rejected() {
        let content = valid_config().replace("min_price = 5.0", "min_price = 600.0");
        let file = write_temp(&content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let content = valid_config().replace("regular_interval_minutes = 30", "regular_interval_minutes = 0");
        let file = write_temp(&content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rsi_ordering_enforced() {
        let content = valid_config().replace("rsi_oversold = 30.0", "rsi_oversold = 80.0");
        let file = write_temp(&content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_conversions() {
        let file = write_temp(&valid_config());
        let config = load_config(file.path()).unwrap();

        let limits = RiskLimits::from(&config);
        assert_eq!(limits.max_open_positions, 5);

        let schedule = ScheduleConfig::from(&config);
        assert_eq!(schedule.pre_market.mode, CycleMode::Aggressive);
        assert_eq!(schedule.after_hours.interval_minutes, 60);

        let scanner = ScannerConfig::from(&config);
        assert_eq!(scanner.bar_lookback, 60);
    }

    #[test]
    fn test_parse_error_surfaces() {
        let file = write_temp("not valid toml [[");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }
}
