//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "URTSI";

/// Config file name
const CONFIG_FILE_NAME: &str = "urtsi.toml";

/// Directory name under the platform config directory
const APP_DIR_NAME: &str = "urtsi-bridge";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "URTSI_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `URTSI_CONFIG` environment variable (explicit path)
    /// 2. `./urtsi.toml` (current directory)
    /// 3. `~/.config/urtsi-bridge/urtsi.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\urtsi-bridge\urtsi.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. XDG config directory (Linux/macOS) or APPDATA (Windows)
    if let Some(config_dir) = get_config_dir() {
        let app_config = config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `URTSI_<SECTION>_<KEY>`
/// For example:
/// - `URTSI_LOGGING_LEVEL=debug`
/// - `URTSI_SERIAL_OPEN_TIMEOUT_MS=500`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{}_LOGGING_FORMAT", ENV_PREFIX)) {
        config.logging.format = val
            .parse()
            .map_err(|e: String| ConfigError::env_parse(format!("{}_LOGGING_FORMAT", ENV_PREFIX), e))?;
    }

    // Serial overrides
    if let Ok(val) = std::env::var(format!("{}_SERIAL_OPEN_TIMEOUT_MS", ENV_PREFIX)) {
        config.serial.open_timeout_ms = val.parse().map_err(|_| {
            ConfigError::env_parse(
                format!("{}_SERIAL_OPEN_TIMEOUT_MS", ENV_PREFIX),
                "Invalid timeout",
            )
        })?;
    }
    if let Ok(val) = std::env::var(format!("{}_SERIAL_VERIFY_PORT_EXISTS", ENV_PREFIX)) {
        config.serial.verify_port_exists = val.to_lowercase() == "true" || val == "1";
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.open_timeout_ms, 2000);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("URTSI_SERIAL_OPEN_TIMEOUT_MS", "333");
        env::set_var("URTSI_LOGGING_FORMAT", "compact");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.open_timeout_ms, 333);
        assert_eq!(loader.config().logging.format, LogFormat::Compact);

        env::remove_var("URTSI_SERIAL_OPEN_TIMEOUT_MS");
        env::remove_var("URTSI_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_invalid_env_override_is_an_error() {
        env::set_var("URTSI_SERIAL_OPEN_TIMEOUT_MS", "soon");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));

        env::remove_var("URTSI_SERIAL_OPEN_TIMEOUT_MS");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bindings = [\"shutters.toml\"]\n\n[serial]\nverify_port_exists = false"
        )
        .unwrap();

        let loader = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(loader.config().bindings, vec![PathBuf::from("shutters.toml")]);
        assert!(!loader.config().serial.verify_port_exists);
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial]\nopen_timeout_ms = 0").unwrap();

        let err = ConfigLoader::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
