/// Configuration schema and defaults for agrisensa.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[market]`, `[display]`, `[web]` and `[logging]`.
///
/// Every field has a built-in default; users only set what they want to
/// override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level agrisensa configuration.
///
/// Maps directly to `~/.agrisensa/config.toml` and `.agrisensa.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgrisensaConfig {
    pub backend: BackendConfig,
    pub market: MarketConfig,
    pub display: DisplayConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Prediction/knowledge backend the dashboard talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; endpoint paths such as `/api/market/predict` are appended.
    pub base_url: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 15_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [market]
// ---------------------------------------------------------------------------

/// Price-trend defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Commodity used when none is given on the command line.
    pub default_commodity: String,
    /// History window in days used when none is given.
    pub default_range: u32,
    /// History windows the period selector offers.
    pub ranges: Vec<u32>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            default_commodity: "cabai_merah_keriting".to_string(),
            default_range: 30,
            ranges: vec![7, 30, 90, 180, 365],
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_prefix: String,
    pub thousands_separator: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_prefix: "Rp".to_string(),
            thousands_separator: ".".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `agrisensa web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`, or a full
    /// `tracing` filter such as `"agrisensa=debug"`. `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl AgrisensaConfig {
    /// Generate the annotated default TOML config file content.
    pub fn default_toml() -> String {
        r#"# agrisensa configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (AGRISENSA_*)
#   2. Project config (.agrisensa.toml in current directory)
#   3. User global config (~/.agrisensa/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://127.0.0.1:5000"
timeout_ms = 15000

[market]
default_commodity = "cabai_merah_keriting"
default_range = 30                   # days of history
ranges = [7, 30, 90, 180, 365]

[display]
currency_prefix = "Rp"
thousands_separator = "."

[web]
addr = "127.0.0.1:9747"
open_browser = true

[logging]
level = "warn"                       # overridden by RUST_LOG / AGRISENSA_LOG
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_to_defaults() {
        let parsed: AgrisensaConfig = toml::from_str(&AgrisensaConfig::default_toml()).unwrap();
        assert_eq!(parsed, AgrisensaConfig::default());
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let toml_str = r#"
[backend]
base_url = "http://10.0.0.5:8000"
"#;
        let parsed: AgrisensaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.backend.base_url, "http://10.0.0.5:8000");
        assert_eq!(parsed.backend.timeout_ms, 15_000);
        assert_eq!(parsed.market.default_range, 30);
        assert_eq!(parsed.display.currency_prefix, "Rp");
    }

    #[test]
    fn empty_toml_is_default() {
        let parsed: AgrisensaConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, AgrisensaConfig::default());
    }

    #[test]
    fn default_ranges_include_default_range() {
        let market = MarketConfig::default();
        assert!(market.ranges.contains(&market.default_range));
    }
}
