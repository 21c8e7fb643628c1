//! Server configuration module.
//!
//! Configuration is loaded from `MERCERIA_*` environment variables with
//! fallback to defaults.

use merceria_core::validation::validate_tax_rate_bps;
use merceria_core::{
    Quantity, TaxRate, DEFAULT_LOW_STOCK_UNITS, DEFAULT_TAX_RATE_BPS, MAX_STOCK_UNITS,
};
use serde::Serialize;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size (roughly one per register)
    pub db_max_connections: u32,

    /// Tax rate in basis points applied to every sale
    pub tax_rate_bps: u32,

    /// Low-stock report threshold, in whole units
    pub low_stock_threshold: i64,

    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,

    /// Return internal error details in responses (development only)
    pub expose_error_details: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ServerConfig {
            bind_addr: var("MERCERIA_BIND_ADDR", "0.0.0.0:3000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERCERIA_BIND_ADDR".to_string()))?,

            database_path: PathBuf::from(var("MERCERIA_DATABASE_PATH", "./merceria.db")),

            db_max_connections: var("MERCERIA_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERCERIA_DB_MAX_CONNECTIONS".to_string()))?,

            tax_rate_bps: var("MERCERIA_TAX_RATE_BPS", &DEFAULT_TAX_RATE_BPS.to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERCERIA_TAX_RATE_BPS".to_string()))?,

            low_stock_threshold: var(
                "MERCERIA_LOW_STOCK_THRESHOLD",
                &DEFAULT_LOW_STOCK_UNITS.to_string(),
            )
            .parse()
            .map_err(|_| ConfigError::InvalidValue("MERCERIA_LOW_STOCK_THRESHOLD".to_string()))?,

            log_filter: var("MERCERIA_LOG", "info"),

            expose_error_details: var("MERCERIA_EXPOSE_ERROR_DETAILS", "false")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERCERIA_EXPOSE_ERROR_DETAILS".to_string()))?,
        };

        if validate_tax_rate_bps(config.tax_rate_bps).is_err() {
            return Err(ConfigError::InvalidValue("MERCERIA_TAX_RATE_BPS".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("MERCERIA_DB_MAX_CONNECTIONS".to_string()));
        }
        if !(0..=MAX_STOCK_UNITS).contains(&config.low_stock_threshold) {
            return Err(ConfigError::InvalidValue("MERCERIA_LOW_STOCK_THRESHOLD".to_string()));
        }

        Ok(config)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checked at load time to fit in [`MAX_STOCK_UNITS`].
    pub fn low_stock_threshold(&self) -> Quantity {
        Quantity::from_units(self.low_stock_threshold)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.tax_rate().bps(), 1800);
        assert_eq!(config.low_stock_threshold().milli(), 10_000);
        assert!(!config.expose_error_details);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("MERCERIA_TAX_RATE_BPS", "10001")]),
            Err(ConfigError::InvalidValue(var)) if var == "MERCERIA_TAX_RATE_BPS"
        ));
        assert!(load(&[("MERCERIA_BIND_ADDR", "nowhere")]).is_err());
        assert!(load(&[("MERCERIA_DB_MAX_CONNECTIONS", "0")]).is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(matches!(
            load(&[("MERCERIA_LOW_STOCK_THRESHOLD", "9223372036854775807")]),
            Err(ConfigError::InvalidValue(var)) if var == "MERCERIA_LOW_STOCK_THRESHOLD"
        ));
        assert!(load(&[("MERCERIA_LOW_STOCK_THRESHOLD", "-1")]).is_err());
        let config = load(&[("MERCERIA_LOW_STOCK_THRESHOLD", "25")]).unwrap();
        assert_eq!(config.low_stock_threshold().milli(), 25_000);
    }

    #[test]
    fn test_expose_details_must_be_a_bool() {
        assert!(matches!(
            load(&[("MERCERIA_EXPOSE_ERROR_DETAILS", "yes")]),
            Err(ConfigError::InvalidValue(var)) if var == "MERCERIA_EXPOSE_ERROR_DETAILS"
        ));
        assert!(load(&[("MERCERIA_EXPOSE_ERROR_DETAILS", "true")]).unwrap().expose_error_details);
    }
}
