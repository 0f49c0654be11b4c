//! Configuration module for urtsi-bridge.
//!
//! Two kinds of TOML files are involved: the application configuration
//! (serial and logging settings plus the list of binding files) and the
//! binding files themselves, each of which is one configuration context.
//!
//! # Configuration Resolution
//!
//! 1. `URTSI_CONFIG` environment variable (explicit path)
//! 2. `./urtsi.toml` (current directory)
//! 3. `~/.config/urtsi-bridge/urtsi.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\urtsi-bridge\urtsi.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! - `URTSI_LOGGING_LEVEL`, `URTSI_LOGGING_FORMAT`
//! - `URTSI_SERIAL_OPEN_TIMEOUT_MS`, `URTSI_SERIAL_VERIFY_PORT_EXISTS`
//!
//! # Example
//!
//! ```toml
//! bindings = ["/etc/urtsi/living-room.toml"]
//!
//! [serial]
//! open_timeout_ms = 2000
//! verify_port_exists = true
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

mod bindings;
mod error;
mod loader;
mod schema;

pub use bindings::{BindingEntry, BindingFile};
pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
