//! Serial transport layer.
//!
//! Provides the transport traits, the `serialport`-backed implementation and
//! mocks for testing without hardware.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::{discover_ports, SyncSerialPort, SystemPortOpener};
pub use traits::*;
