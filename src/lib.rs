//! URTSI Bridge Library
//!
//! Maps abstract roller shutter commands (up/down/stop) onto the serial
//! protocol of URTSI multi-channel shutter controllers.
//!
//! # Modules
//!
//! - `binding`: items, commands, `<port>:<channel>` bindings and their store
//! - `config`: TOML configuration and binding files
//! - `device`: per-port write workers and the registry that owns them
//! - `logging`: tracing subscriber setup
//! - `port`: serial transport abstraction, real and mock
//! - `protocol`: the five-byte URTSI wire format
//! - `service`: the binding service tying it all together
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use urtsi_bridge::{Command, Item, MockPortOpener, UrtsiBinding};
//!
//! let opener = MockPortOpener::new();
//! let binding = UrtsiBinding::new(Arc::new(opener.clone()));
//!
//! binding.register("living-room", &Item::rollershutter("Shutter_Living"), "/dev/ttyUSB0:3")?;
//! if let Some(ticket) = binding.dispatch("Shutter_Living", Command::Down) {
//!     ticket.wait()?;
//! }
//!
//! let port = opener.last_opened("/dev/ttyUSB0").unwrap();
//! assert_eq!(port.written_strings(), vec!["0103D"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binding;
pub mod config;
pub mod device;
pub mod logging;
pub mod port;
pub mod protocol;
pub mod service;

// Re-export commonly used types for convenience
pub use binding::{BindingError, BindingResult, Channel, Command, Item, ItemBinding, ItemKind};
pub use config::{BindingFile, Config, ConfigError, ConfigLoader, ConfigResult};
pub use device::{DeviceConnection, DeviceRegistry, WriteTicket};
pub use port::{
    MockPortOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, SerialPortAdapter,
    SyncSerialPort, SystemPortOpener,
};
pub use service::{LoadReport, UrtsiBinding, BINDING_TYPE};
