use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOOKUP_CACHE_CAPACITY: usize = 1000;

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_lookup_cache_capacity() -> usize {
    DEFAULT_LOOKUP_CACHE_CAPACITY
}

/// Application configuration, loaded from the environment with the `APP`
/// prefix and `__` separator (e.g. `APP__DATABASE_URL`).
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL (postgres for deployment, `sqlite::memory:`
    /// in tests).
    #[validate(length(min = 1))]
    pub database_url: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    /// Upper bound on cached item display names (see `lookup`).
    #[serde(default = "default_lookup_cache_capacity")]
    pub lookup_cache_capacity: usize,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Loads configuration from the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_env() {
        std::env::set_var("APP__DATABASE_URL", "sqlite::memory:");
        let cfg = load_config().expect("config should load");
        assert_eq!(cfg.database_url, "sqlite::memory:");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.lookup_cache_capacity, 1000);
        std::env::remove_var("APP__DATABASE_URL");
    }
}
