use crate::error::AppError;
use ::config::{Config as Cfg, Environment, File};
use serde::Deserialize;

/// Settings every service reads from the process environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector endpoint; spans are only exported when this is set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from an optional `configuration.*` file, then plain environment
    /// variables (`PORT`, `LOG_LEVEL`, `OTEL_EXPORTER_OTLP_ENDPOINT`).
    ///
    /// Does not read `.env`; the calling service loads it once before this.
    pub fn load(default_port: u16) -> Result<Self, AppError> {
        let config = Cfg::builder()
            .set_default("port", i64::from(default_port))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
