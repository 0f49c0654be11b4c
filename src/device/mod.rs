//! Device layer: live connections and the registry that owns them.

pub mod connection;
pub mod registry;

pub use connection::{DeviceConnection, WriteTicket};
pub use registry::DeviceRegistry;
