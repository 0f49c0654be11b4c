//! Item bindings: what an item is, which port and channel it is wired to, and
//! the store that keeps those bindings grouped by configuration context.

pub mod config;
pub mod error;
pub mod item;
pub mod store;

pub use config::{Channel, ItemBinding, BINDING_PATTERN};
pub use error::{BindingError, BindingResult};
pub use item::{Command, Item, ItemKind};
pub use store::ItemConfigStore;
