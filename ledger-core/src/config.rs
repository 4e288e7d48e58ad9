/// Ledger configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LEDGER_DATA_DIR | ./data | directory holding `ledger.json` and logs |
/// | DEFAULT_TAX_RATE | 0.19 | tax rate (fraction) when a draft omits one |
/// | INVOICE_DUE_DAYS | 30 | days from invoice date to due date |
/// | INVOICE_PREFIX | INV | invoice number prefix |
/// | LOG_LEVEL | info | log level |
/// | LOG_JSON | false | JSON log output |
/// | ENVIRONMENT | development | runtime environment |
///
/// # Example
///
/// ```ignore
/// LEDGER_DATA_DIR=/srv/ledger DEFAULT_TAX_RATE=0.2 cargo run --bin ledger-report
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// Data directory (store file, logs)
    pub data_dir: String,
    /// Fraction, 0.19 = 19%
    pub default_tax_rate: f64,
    pub invoice_due_days: u32,
    pub invoice_prefix: String,
    pub log_level: String,
    pub log_json: bool,
    /// development | staging | production
    pub environment: String,
}

const DEFAULT_TAX_RATE: f64 = 0.19;
const DEFAULT_DUE_DAYS: u32 = 30;

impl LedgerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            data_dir: lookup("LEDGER_DATA_DIR").unwrap_or_else(|| "./data".into()),
            default_tax_rate: lookup("DEFAULT_TAX_RATE")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .unwrap_or(DEFAULT_TAX_RATE),
            invoice_due_days: lookup("INVOICE_DUE_DAYS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DUE_DAYS),
            invoice_prefix: lookup("INVOICE_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "INV".into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        }
    }

    /// Override the data directory
    ///
    /// Mostly for tests
    pub fn with_overrides(data_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.data_dir = data_dir.into();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Log directory under the data directory
    pub fn log_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("logs")
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> LedgerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.default_tax_rate, 0.19);
        assert_eq!(config.invoice_due_days, 30);
        assert_eq!(config.invoice_prefix, "INV");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.is_development());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = config_from(&[
            ("LEDGER_DATA_DIR", "/srv/ledger"),
            ("DEFAULT_TAX_RATE", "0.2"),
            ("INVOICE_DUE_DAYS", "45"),
            ("INVOICE_PREFIX", "FAC"),
            ("LOG_JSON", "true"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.data_dir, "/srv/ledger");
        assert_eq!(config.default_tax_rate, 0.2);
        assert_eq!(config.invoice_due_days, 45);
        assert_eq!(config.invoice_prefix, "FAC");
        assert!(config.log_json);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("DEFAULT_TAX_RATE", "-0.5"),
            ("INVOICE_DUE_DAYS", "soon"),
            ("INVOICE_PREFIX", "  "),
        ]);
        assert_eq!(config.default_tax_rate, 0.19);
        assert_eq!(config.invoice_due_days, 30);
        assert_eq!(config.invoice_prefix, "INV");
    }
}
