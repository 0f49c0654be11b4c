//! Binding service: the one object the host talks to.
//!
//! It owns the item configuration store and the device registry behind a
//! single lock, so configuration changes and command dispatch never see a
//! half-applied state. Opening a port and draining a closing one both happen
//! outside that lock; dispatch only ever waits for map updates.
//!
//! # Architecture
//!
//! ```text
//! command ──> UrtsiBinding::dispatch ──> ItemConfigStore (item → port, channel)
//!                                    ──> protocol::encode_command
//!                                    ──> DeviceRegistry (port → connection)
//!                                    ──> per-port write worker ──> serial port
//! ```

use crate::{
    binding::{BindingError, BindingResult, Channel, Command, Item, ItemBinding, ItemConfigStore},
    config::BindingFile,
    device::{DeviceConnection, DeviceRegistry, WriteTicket},
    port::PortOpener,
    protocol,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identifier of this binding in item configurations.
pub const BINDING_TYPE: &str = "urtsi";

// ========== Result Types ==========

/// Outcome of loading one binding file as a context.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub context: String,
    /// Items that were bound
    pub registered: Vec<String>,
    /// Items that were rejected, with the reason
    pub failures: Vec<(String, BindingError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ========== Service Implementation ==========

#[derive(Debug)]
struct BindingState {
    store: ItemConfigStore,
    registry: DeviceRegistry,
}

impl BindingState {
    /// Store a binding whose port reference is already held, releasing the
    /// reference of the binding it replaces.
    fn store_binding(
        &mut self,
        context: &str,
        item_name: &str,
        binding: &ItemBinding,
        released: &mut Vec<DeviceConnection>,
    ) {
        if let Some(previous) = self.store.insert(context, item_name, binding.clone()) {
            debug!("Item {} rebound from {} to {}", item_name, previous, binding);
            released.extend(self.registry.release(&previous.port));
        }
    }
}

/// Drain and close connections handed back by the registry.
fn close_connections(connections: Vec<DeviceConnection>) {
    for mut connection in connections {
        connection.close();
        info!("Closed connection to {}", connection.port());
    }
}

/// URTSI binding service.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct UrtsiBinding {
    state: Arc<Mutex<BindingState>>,
}

impl UrtsiBinding {
    /// Create a service that opens ports through `opener`.
    pub fn new(opener: Arc<dyn PortOpener>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BindingState {
                store: ItemConfigStore::new(),
                registry: DeviceRegistry::new(opener),
            })),
        }
    }

    pub fn binding_type(&self) -> &'static str {
        BINDING_TYPE
    }

    /// Reject items that are not rollershutters.
    pub fn validate_item_type(item: &Item) -> BindingResult<()> {
        if item.kind.is_shutter() {
            Ok(())
        } else {
            Err(BindingError::TypeMismatch {
                item: item.name.clone(),
                kind: item.kind.to_string(),
            })
        }
    }

    /// Bind `item` to the port and channel in `config` under `context`.
    ///
    /// The port is opened if this is its first binding. Any error leaves the
    /// service exactly as it was. Binding an item that is already bound
    /// replaces its old binding.
    pub fn register(&self, context: &str, item: &Item, config: &str) -> BindingResult<ItemBinding> {
        Self::validate_item_type(item)?;
        let binding = ItemBinding::parse(config)?;

        let mut released = Vec::new();
        let result = self.attach(context, &item.name, &binding, &mut released);
        close_connections(released);
        result?;

        info!(
            "Bound item {} to {} channel {} ({})",
            item.name, binding.port, binding.channel, context
        );
        Ok(binding)
    }

    /// Take a reference on the binding's port and store the binding.
    ///
    /// A port that is not open yet is opened without holding the lock, so
    /// dispatch to other ports carries on during the open timeout.
    fn attach(
        &self,
        context: &str,
        item_name: &str,
        binding: &ItemBinding,
        released: &mut Vec<DeviceConnection>,
    ) -> BindingResult<()> {
        let opener = {
            let mut state = self.state.lock();
            if state.registry.retain(&binding.port) {
                state.store_binding(context, item_name, binding, released);
                return Ok(());
            }
            state.registry.opener()
        };

        let opened = DeviceRegistry::connect(opener.as_ref(), &binding.port);

        let mut state = self.state.lock();
        match opened {
            Ok(connection) => released.extend(state.registry.adopt(connection)),
            // Another registration may have opened the port meanwhile.
            Err(_) if state.registry.retain(&binding.port) => {}
            Err(source) => {
                return Err(BindingError::Initialization {
                    port: binding.port.clone(),
                    source,
                })
            }
        }
        state.store_binding(context, item_name, binding, released);
        Ok(())
    }

    /// Remove every binding registered under `context`.
    ///
    /// Ports still referenced from other contexts stay open. Returns the
    /// number of bindings removed.
    pub fn remove_context(&self, context: &str) -> usize {
        let (count, released) = {
            let mut state = self.state.lock();
            let removed = state.store.remove_context(context);

            let mut released = Vec::new();
            for (item_name, binding) in &removed {
                debug!("Removed binding for item {} ({})", item_name, binding);
                released.extend(state.registry.release(&binding.port));
            }
            (removed.len(), released)
        };

        // Draining happens here, outside the lock.
        close_connections(released);

        if count > 0 {
            info!("Removed {} binding(s) of context {}", count, context);
        }
        count
    }

    /// Replace `context` with the items of `file`.
    ///
    /// Items are registered one by one; a failing item is reported and
    /// skipped without affecting the others.
    pub fn load_context(&self, context: &str, file: &BindingFile) -> LoadReport {
        self.remove_context(context);

        let mut report = LoadReport {
            context: context.to_string(),
            ..Default::default()
        };

        for (entry, item) in file.checked_items() {
            match item.and_then(|item| self.register(context, &item, &entry.urtsi)) {
                Ok(_) => report.registered.push(entry.name.clone()),
                Err(e) => {
                    warn!("Skipping item '{}' in {}: {}", entry.name, context, e);
                    report.failures.push((entry.name.clone(), e));
                }
            }
        }
        report
    }

    /// Translate `command` for `item_name` and queue it on the item's port.
    ///
    /// Unknown items and commands without a movement meaning are ignored and
    /// yield `None`. Write failures are logged by the port's worker; the
    /// returned ticket can be used to observe them.
    pub fn dispatch(&self, item_name: &str, command: Command) -> Option<WriteTicket> {
        let state = self.state.lock();
        let binding = state.store.resolve(item_name)?;

        let Some(payload) = protocol::encode_command(binding.channel, command) else {
            debug!("Ignoring {} for item {}", command, item_name);
            return None;
        };

        let Some(connection) = state.registry.get(&binding.port) else {
            warn!("No open connection for {} (item {})", binding.port, item_name);
            return None;
        };

        match connection.enqueue(payload.into_bytes()) {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                warn!("Could not queue {} for item {}: {}", command, item_name, e);
                None
            }
        }
    }

    /// A command sent to an item.
    pub fn receive_command(&self, item_name: &str, command: Command) -> Option<WriteTicket> {
        self.dispatch(item_name, command)
    }

    /// A state update of an item; translated exactly like a command.
    pub fn receive_update(&self, item_name: &str, state: Command) -> Option<WriteTicket> {
        self.dispatch(item_name, state)
    }

    pub fn resolve(&self, item_name: &str) -> Option<ItemBinding> {
        self.state.lock().store.resolve(item_name).cloned()
    }

    /// Port the item is wired to.
    pub fn device_port(&self, item_name: &str) -> Option<String> {
        self.resolve(item_name).map(|b| b.port)
    }

    /// Channel the item is wired to.
    pub fn channel(&self, item_name: &str) -> Option<Channel> {
        self.resolve(item_name).map(|b| b.channel)
    }

    /// Ports with an open connection, sorted.
    pub fn open_ports(&self) -> Vec<String> {
        self.state.lock().registry.open_ports()
    }

    /// Known contexts, sorted.
    pub fn contexts(&self) -> Vec<String> {
        self.state.lock().store.contexts()
    }

    /// Items bound under `context`, sorted.
    pub fn items_in(&self, context: &str) -> Vec<String> {
        self.state.lock().store.items_in(context)
    }

    /// Drop every binding and close every port.
    pub fn shutdown(&self) {
        let connections = {
            let mut state = self.state.lock();
            state.store.clear();
            state.registry.take_all()
        };
        close_connections(connections);
        info!("URTSI binding shut down");
    }
}

impl std::fmt::Debug for UrtsiBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrtsiBinding")
            .field("open_ports", &self.open_ports())
            .field("contexts", &self.contexts())
            .finish()
    }
}
