use crate::error::ConfigError;
use config::{Environment, File};
use std::env;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    DatabaseConfig, LoggingConfig, NotifierConfig, ServerConfig, ServiceConfig, Settings,
};

/// Prefix for environment overrides, e.g. `DUMPTRAC__SERVER__PORT=9000`.
const ENV_PREFIX: &str = "DUMPTRAC";

/// Loads the application configuration.
///
/// Sources, later ones winning: built-in defaults, an optional `config.toml` in the
/// working directory, `DUMPTRAC__*` environment variables, and `DATABASE_URL`.
/// The result is validated before it is returned.
pub fn load_config() -> Result<Settings, ConfigError> {
    build(File::with_name("config").required(false))
}

/// Same as [`load_config`], but reads the given TOML file, which must exist.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    build(File::from(path).required(true))
}

fn build<T>(file: T) -> Result<Settings, ConfigError>
where
    T: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .set_default("service.name", "dumpTrac")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("database.url", "")?
        .set_default("database.max_connections", 10)?
        .set_default("database.acquire_timeout_secs", 5)?
        .set_default("notifier.timeout_secs", 10)?
        .set_default("logging.level", "info,tower_http=debug")?
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", env::var("DATABASE_URL").ok())?
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
