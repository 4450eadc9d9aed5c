use crate::error::AppError;
use config::{Config as Cfg, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Settings every binary in the workspace shares.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; tracing stays local when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_service_name() -> String {
    "inventory-client".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        load()
    }
}

/// Load any settings type from `configuration.*` plus `APP__` environment
/// variables, after `.env` has been applied.
pub fn load<T: DeserializeOwned>() -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let builder = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    load_from(builder)
}

/// Build and deserialize a prepared builder. Tests use this with in-memory
/// sources.
pub fn load_from<T: DeserializeOwned>(builder: ConfigBuilder<DefaultState>) -> Result<T, AppError> {
    let config = builder.build()?;
    Ok(config.try_deserialize()?)
}
