use serde::Deserialize;
use std::env;

use sale_core::parameters::ConfigParameter;
use sale_order::SaleRules;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub sale: SaleConfig,
    /// Initial system parameters, loaded into the parameter store at start-up
    #[serde(default)]
    pub parameters: Vec<ConfigParameter>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaleConfig {
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub lang: Option<String>,
    #[serde(default = "default_order_prefix")]
    pub order_prefix: String,
    /// Initial value of `sale.customize`
    pub customize: Option<String>,
}

fn default_currency() -> String { "USD".to_string() }

fn default_order_prefix() -> String { "S".to_string() }

impl SaleConfig {
    pub fn rules(&self) -> SaleRules {
        SaleRules {
            tax_rate_bps: self.tax_rate_bps,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SALE__SALE__TAX_RATE_BPS=2100` sets `sale.tax_rate_bps`
            .add_source(config::Environment::with_prefix("SALE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a single TOML document, without file or environment layering
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
