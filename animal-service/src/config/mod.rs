use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BREEDS_PORT: u16 = 8082;
pub const DEFAULT_MONGO_URL: &str = "mongodb://localhost/animals";
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct AnimalConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    /// Seeds the `breeds` collection and serves `/animals/cats`.
    pub breeds_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub url: Secret<String>,
    /// Overrides the database named in `url`. Tests use this to isolate runs.
    pub database: Option<String>,
    pub probe_interval: Duration,
}

impl AnimalConfig {
    /// Load `.env` (once, for the whole process), then read the service
    /// settings. `BREEDS_ENABLED` is read first because it picks the default port.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let breeds_enabled = parse_bool("BREEDS_ENABLED", false)?;
        let default_port = if breeds_enabled {
            DEFAULT_BREEDS_PORT
        } else {
            DEFAULT_PORT
        };
        let common = core_config::Config::load(default_port)?;

        let probe_secs = match env::var("MONGO_PROBE_INTERVAL_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MONGO_PROBE_INTERVAL_SECS must be a whole number of seconds: {}",
                    e
                ))
            })?,
            Err(_) => DEFAULT_PROBE_INTERVAL_SECS,
        };
        if probe_secs == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGO_PROBE_INTERVAL_SECS must be greater than zero"
            )));
        }

        Ok(AnimalConfig {
            common,
            mongodb: MongoConfig {
                url: Secret::new(
                    env::var("MONGO_URL").unwrap_or_else(|_| DEFAULT_MONGO_URL.to_string()),
                ),
                database: None,
                probe_interval: Duration::from_secs(probe_secs),
            },
            breeds_enabled,
        })
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool, AppError> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} must be a boolean, got '{}'",
                key,
                other
            ))),
        },
        Err(_) => Ok(default),
    }
}
