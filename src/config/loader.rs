//! Configuration Loader
//!
//! Builds a [`RelayConfig`] from defaults, an optional TOML file and the
//! environment, then validates it.

use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::RelayConfig;
use crate::error::{RelayError, RelayResult};

pub const ENV_PREFIX: &str = "ORDER_RELAY";
pub const CONFIG_PATH_ENV: &str = "ORDER_RELAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/order-relay.toml";

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::configuration(err.to_string())
    }
}

/// Layer defaults, file and environment.
///
/// `path` is required to exist when given explicitly; the default location
/// is optional. `env_vars` replaces the process environment (tests).
pub fn load_layered(
    path: Option<&Path>,
    env_vars: Option<HashMap<String, String>>,
) -> RelayResult<RelayConfig> {
    let lookup = |key: &str| match &env_vars {
        Some(vars) => vars.get(key).cloned(),
        None => env::var(key).ok(),
    };

    let (config_path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match lookup(CONFIG_PATH_ENV) {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        },
    };

    debug!(
        config_path = %config_path.display(),
        required = required,
        "Loading relay configuration"
    );

    let settings = Config::builder()
        .add_source(Config::try_from(&RelayConfig::default())?)
        .add_source(
            File::from(config_path.as_path())
                .format(FileFormat::Toml)
                .required(required),
        )
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env_vars.clone()),
        )
        .set_override_option("database.url", lookup("DATABASE_URL"))?
        .build()?;

    let config: RelayConfig = settings.try_deserialize()?;
    config.validate()?;

    info!(
        database_url = %config.redacted_database_url(),
        orders_queue = %config.queues.orders,
        finalize_queue = %config.queues.orders_finalize,
        table = %config.table.name,
        "✅ Configuration loaded"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = load_layered(None, Some(HashMap::new())).unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_toml(
            r#"
            [queues]
            orders = "orders_staging"

            [consumer]
            batch_size = 4
            "#,
        );

        let config = load_layered(Some(file.path()), Some(HashMap::new())).unwrap();
        assert_eq!(config.queues.orders, "orders_staging");
        assert_eq!(config.queues.orders_finalize, "orders_finalize");
        assert_eq!(config.consumer.batch_size, 4);
        assert_eq!(config.consumer.max_delivery_count, 5);
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_toml(
            r#"
            [web]
            bind_address = "127.0.0.1:9000"
            "#,
        );
        let env_vars = HashMap::from([
            (
                "ORDER_RELAY__WEB__BIND_ADDRESS".to_string(),
                "127.0.0.1:9100".to_string(),
            ),
            (
                "ORDER_RELAY__CONSUMER__MAX_DELIVERY_COUNT".to_string(),
                "3".to_string(),
            ),
            (
                "DATABASE_URL".to_string(),
                "postgresql://relay:pw@db/orders".to_string(),
            ),
        ]);

        let config = load_layered(Some(file.path()), Some(env_vars)).unwrap();
        assert_eq!(config.web.bind_address, "127.0.0.1:9100");
        assert_eq!(config.consumer.max_delivery_count, 3);
        assert_eq!(config.database.url, "postgresql://relay:pw@db/orders");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = load_layered(
            Some(Path::new("/nonexistent/order-relay.toml")),
            Some(HashMap::new()),
        );
        assert!(matches!(result, Err(RelayError::Configuration { .. })));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let file = write_toml(
            r#"
            [queues]
            orders = "same"
            orders_finalize = "same"
            "#,
        );
        let result = load_layered(Some(file.path()), Some(HashMap::new()));
        assert!(matches!(result, Err(RelayError::Configuration { .. })));
    }
}
