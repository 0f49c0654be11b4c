//! Port → connection registry.
//!
//! The registry is the only place that opens transports. Every binding that
//! references a port holds one reference; the connection is opened on the
//! first reference and handed back to the caller when the last one is
//! released. Connections close when dropped, so the caller decides where the
//! queue drain happens, typically after letting go of any lock.

use super::connection::DeviceConnection;
use crate::port::{PortError, PortOpener};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct RegistryEntry {
    connection: DeviceConnection,
    references: usize,
}

/// Owns one `DeviceConnection` per referenced port.
pub struct DeviceRegistry {
    opener: Arc<dyn PortOpener>,
    entries: HashMap<String, RegistryEntry>,
}

impl DeviceRegistry {
    pub fn new(opener: Arc<dyn PortOpener>) -> Self {
        Self {
            opener,
            entries: HashMap::new(),
        }
    }

    /// The opener used for new connections.
    pub fn opener(&self) -> Arc<dyn PortOpener> {
        Arc::clone(&self.opener)
    }

    /// Open `port` and start its worker, without registering it.
    pub fn connect(opener: &dyn PortOpener, port: &str) -> Result<DeviceConnection, PortError> {
        let transport = opener.open(port)?;
        DeviceConnection::start(transport)
    }

    /// Take a reference on `port`, opening it if nobody holds it yet.
    ///
    /// On failure nothing is inserted.
    pub fn acquire(&mut self, port: &str) -> Result<(), PortError> {
        if self.retain(port) {
            return Ok(());
        }
        let connection = Self::connect(self.opener.as_ref(), port)?;
        // Nobody else can have inserted it; we hold `&mut self`.
        drop(self.adopt(connection));
        Ok(())
    }

    /// Take a reference on `port` if it is already open.
    pub fn retain(&mut self, port: &str) -> bool {
        match self.entries.get_mut(port) {
            Some(entry) => {
                entry.references += 1;
                debug!("Port {} now has {} reference(s)", port, entry.references);
                true
            }
            None => false,
        }
    }

    /// Register a connection opened with [`connect`](Self::connect) and take
    /// a reference on it.
    ///
    /// If the port was opened by someone else in the meantime, the existing
    /// connection gets the reference and `connection` is handed back unused.
    pub fn adopt(&mut self, connection: DeviceConnection) -> Option<DeviceConnection> {
        let port = connection.port().to_string();
        if self.retain(&port) {
            return Some(connection);
        }
        debug!("Port {} now has 1 reference(s)", port);
        self.entries.insert(
            port,
            RegistryEntry {
                connection,
                references: 1,
            },
        );
        None
    }

    /// Drop one reference on `port`.
    ///
    /// When none remain the connection is removed and returned; dropping or
    /// closing it drains its queue and closes the port.
    pub fn release(&mut self, port: &str) -> Option<DeviceConnection> {
        let Some(entry) = self.entries.get_mut(port) else {
            warn!("Release of unknown port {}", port);
            return None;
        };

        entry.references = entry.references.saturating_sub(1);
        if entry.references > 0 {
            debug!("Port {} still has {} reference(s)", port, entry.references);
            return None;
        }

        self.entries.remove(port).map(|entry| entry.connection)
    }

    /// Lookup without side effects.
    pub fn get(&self, port: &str) -> Option<&DeviceConnection> {
        self.entries.get(port).map(|e| &e.connection)
    }

    /// Number of bindings holding `port` open.
    pub fn references(&self, port: &str) -> usize {
        self.entries.get(port).map_or(0, |e| e.references)
    }

    /// Ports with an open connection, sorted.
    pub fn open_ports(&self) -> Vec<String> {
        let mut ports: Vec<String> = self.entries.keys().cloned().collect();
        ports.sort();
        ports
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every connection regardless of outstanding references.
    pub fn take_all(&mut self) -> Vec<DeviceConnection> {
        self.entries.drain().map(|(_, entry)| entry.connection).collect()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("open_ports", &self.open_ports())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::MockPortOpener;

    fn registry() -> (DeviceRegistry, MockPortOpener) {
        let opener = MockPortOpener::new();
        (DeviceRegistry::new(Arc::new(opener.clone())), opener)
    }

    #[test]
    fn test_acquire_opens_once_per_port() {
        let (mut registry, opener) = registry();
        registry.acquire("p0").unwrap();
        registry.acquire("p0").unwrap();

        assert_eq!(opener.open_count("p0"), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.references("p0"), 2);
    }

    #[test]
    fn test_release_hands_back_connection_on_last_reference() {
        let (mut registry, opener) = registry();
        registry.acquire("p0").unwrap();
        registry.acquire("p0").unwrap();
        let mock = opener.last_opened("p0").unwrap();

        assert!(registry.release("p0").is_none());
        assert!(registry.get("p0").is_some());

        let mut connection = registry.release("p0").unwrap();
        assert!(registry.get("p0").is_none());
        assert_eq!(mock.close_count(), 0);

        connection.close();
        assert_eq!(mock.close_count(), 1);
    }

    #[test]
    fn test_failed_open_inserts_nothing() {
        let (mut registry, opener) = registry();
        opener.mark_busy("COM3");

        let err = registry.acquire("COM3").unwrap_err();
        assert!(matches!(err, PortError::InUse(_)));
        assert!(registry.is_empty());
        assert_eq!(registry.references("COM3"), 0);
    }

    #[test]
    fn test_release_unknown_port_is_harmless() {
        let (mut registry, _) = registry();
        assert!(registry.release("nowhere").is_none());
    }

    #[test]
    fn test_reopen_after_release() {
        let (mut registry, opener) = registry();
        registry.acquire("p0").unwrap();
        drop(registry.release("p0"));
        registry.acquire("p0").unwrap();

        assert_eq!(opener.open_count("p0"), 2);
        assert!(registry.get("p0").unwrap().is_open());
    }

    #[test]
    fn test_adopt_returns_surplus_connection() {
        let (mut registry, opener) = registry();
        let first = DeviceRegistry::connect(&opener, "p0").unwrap();
        let second = DeviceRegistry::connect(&opener, "p0").unwrap();

        assert!(registry.adopt(first).is_none());
        let surplus = registry.adopt(second).expect("port was already registered");
        assert_eq!(surplus.port(), "p0");
        assert_eq!(registry.references("p0"), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_take_all() {
        let (mut registry, opener) = registry();
        registry.acquire("p0").unwrap();
        registry.acquire("p1").unwrap();
        assert_eq!(registry.open_ports(), vec!["p0", "p1"]);

        drop(registry.take_all());
        assert!(registry.is_empty());
        assert_eq!(opener.last_opened("p0").unwrap().close_count(), 1);
        assert_eq!(opener.last_opened("p1").unwrap().close_count(), 1);
    }
}
