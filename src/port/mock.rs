//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` records every write and close without touching hardware.
//! `MockPortOpener` hands out mock ports and remembers them, so a test can
//! look at what a registry-owned port received after the fact.

use super::error::PortError;
use super::traits::{PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock port, shared between clones.
#[derive(Debug, Default)]
struct MockPortState {
    /// Every payload written, in order.
    write_log: Vec<Vec<u8>>,
    /// Number of flushes.
    flush_count: usize,
    /// Number of times `close` actually released the port.
    close_count: usize,
    /// Whether the port has been closed.
    closed: bool,
    /// Whether writes should fail with an I/O error.
    fail_writes: bool,
    /// How long each write takes.
    write_delay: Duration,
}

/// Mock serial port implementation for testing.
///
/// Clones share state, so the test keeps one clone while the code under test
/// owns the other.
///
/// # Example
/// ```
/// use urtsi_bridge::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// let observer = port.clone();
///
/// port.write_bytes(b"0103D").unwrap();
/// port.close();
///
/// assert_eq!(observer.written_strings(), vec!["0103D".to_string()]);
/// assert_eq!(observer.close_count(), 1);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState::default())),
        }
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// The write log decoded as text, one entry per write.
    pub fn written_strings(&self) -> Vec<String> {
        self.state
            .lock()
            .write_log
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make each subsequent write take `delay`, like a slow device.
    pub fn set_write_delay(&self, delay: Duration) {
        self.state.lock().write_delay = delay;
    }

    /// How many times the port was closed.
    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    /// How many times the port was flushed.
    pub fn flush_count(&self) -> usize {
        self.state.lock().flush_count
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), PortError> {
        let delay = self.state.lock().write_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let mut state = self.state.lock();
        if state.closed {
            return Err(PortError::NotOpen);
        }
        if state.fail_writes {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        state.write_log.push(data.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PortError::NotOpen);
        }
        state.flush_count += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            state.close_count += 1;
        }
    }

    fn is_open(&self) -> bool {
        !self.state.lock().closed
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

#[derive(Debug, Default)]
struct MockOpenerState {
    /// Ports reported by `available_ports`; every name is accepted when empty.
    available: Vec<String>,
    /// Ports whose open fails with `InUse`.
    busy: HashSet<String>,
    /// Every port handed out, newest last per name.
    opened: HashMap<String, Vec<MockSerialPort>>,
}

/// A `PortOpener` that produces `MockSerialPort`s.
#[derive(Debug, Clone, Default)]
pub struct MockPortOpener {
    state: Arc<Mutex<MockOpenerState>>,
}

impl MockPortOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the opener to a fixed set of port names.
    pub fn with_available<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let opener = Self::default();
        opener.state.lock().available = ports.into_iter().map(Into::into).collect();
        opener
    }

    /// Make opening `port` fail as if another process held it.
    pub fn mark_busy(&self, port: impl Into<String>) {
        self.state.lock().busy.insert(port.into());
    }

    /// Total number of times `port` was opened.
    pub fn open_count(&self, port: &str) -> usize {
        self.state.lock().opened.get(port).map_or(0, Vec::len)
    }

    /// The most recently opened mock for `port`.
    pub fn last_opened(&self, port: &str) -> Option<MockSerialPort> {
        self.state
            .lock()
            .opened
            .get(port)
            .and_then(|ports| ports.last().cloned())
    }
}

impl PortOpener for MockPortOpener {
    fn available_ports(&self) -> Result<Vec<String>, PortError> {
        Ok(self.state.lock().available.clone())
    }

    fn open(&self, port_name: &str) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut state = self.state.lock();
        if !state.available.is_empty() && !state.available.iter().any(|p| p == port_name) {
            return Err(PortError::not_found(port_name, state.available.clone()));
        }
        if state.busy.contains(port_name) {
            return Err(PortError::InUse(port_name.to_string()));
        }

        let port = MockSerialPort::new(port_name);
        state
            .opened
            .entry(port_name.to_string())
            .or_default()
            .push(port.clone());
        Ok(Box::new(port))
    }
}
